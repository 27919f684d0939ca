//! Percolation Engine (perc-engine)
//!
//! Estimates how much origin-destination demand in a guarded building stays
//! satisfiable when an adversary may spend a limited privacy budget:
//! 1. **Cost model** ([`Perc`]): one trial of reader and sensor failures
//! 2. **Search**: budgeted least-cost reachability over one trial
//! 3. **Estimator** ([`Estimator`]): Monte-Carlo trials integrated over `rho`
//! 4. **Sweep** ([`percolation`]): one resilience value per budget
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use perc_engine::prelude::*;
//!
//! let network = Network::from_json(&std::fs::read_to_string("network.json")?)?;
//! let config = EngineConfig::default().with_seed(7);
//! let report = percolation(&network, &config)?;
//! print!("{}", report.to_csv());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod cost;
pub mod demand;
pub mod error;
pub mod estimator;
pub mod report;
pub mod search;
pub mod sweep;

pub use config::EngineConfig;
pub use cost::{edge_cost, Draw, EdgeDraws, Perc};
pub use demand::{Demand, DemandTable, DemandWeights, PairDemand, UniformDemand};
pub use error::EngineError;
pub use estimator::{alpha, Estimator};
pub use report::{ResilienceReport, ResilienceRow};
pub use sweep::{percolation, percolation_with, CancelFlag};

/// Common imports for running an analysis
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::demand::{Demand, DemandTable, UniformDemand};
    pub use crate::error::EngineError;
    pub use crate::report::{ResilienceReport, ResilienceRow};
    pub use crate::sweep::{percolation, percolation_with, CancelFlag};
    pub use perc_network::{Network, NetworkDescription};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
