//! Percolation Twin (perc-twin)
//!
//! Turns a digital-twin export of a building into the access network the
//! resilience engine analyses:
//! - [`TwinGraph`]: twins, relationships and the model hierarchy
//! - [`extract`]: spaces to nodes, doors to guarded passages
//!
//! # Example
//!
//! ```rust,ignore
//! use perc_twin::{extract, ExtractorConfig, TwinGraph};
//!
//! let graph = TwinGraph::from_json(&std::fs::read_to_string("twin.json")?)?;
//! let network = extract(&graph, &ExtractorConfig::default())?;
//! println!("{}", network.to_json_pretty()?);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod extract;
pub mod graph;

pub use error::TwinError;
pub use extract::{extract, ExtractorConfig};
pub use graph::{Twin, TwinGraph};

use perc_network::NetworkDescription;

/// Parse a twin document and extract its network with the default models
///
/// # Errors
/// See [`TwinGraph::from_json`] and [`extract`]
pub fn extract_network(twin_json: &str) -> Result<NetworkDescription, TwinError> {
    extract(&TwinGraph::from_json(twin_json)?, &ExtractorConfig::default())
}
