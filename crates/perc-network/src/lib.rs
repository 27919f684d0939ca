//! Percolation Network (perc-network)
//!
//! The graph index every resilience analysis runs on:
//! - [`NetworkDescription`]: the JSON node/edge contract
//! - [`NetworkBuilder`]: checked, incremental construction
//! - [`Network`]: immutable O(1) edge lookup and adjacency over interned nodes
//!
//! # Example
//!
//! ```rust,ignore
//! use perc_network::Network;
//!
//! let network = Network::from_json(&std::fs::read_to_string("network.json")?)?;
//! let edge = network.edge("lobby", "office")?;
//! println!("{} neighbours", network.neighbours("lobby").len());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod description;
pub mod error;
pub mod network;

pub use description::{EdgeDescription, FailMode, NetworkDescription};
pub use error::NetworkError;
pub use network::{Edge, Network, NetworkBuilder};
pub use petgraph::graph::{EdgeIndex, NodeIndex};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
