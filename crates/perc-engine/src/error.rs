//! Error types for the resilience engine
//!
//! All of these are raised before any trial runs: an analysis either starts
//! with a valid network, configuration and demand, or produces nothing.

use perc_network::NetworkError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The network could not be built
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Configuration values are unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file has an extension we cannot parse
    #[error("unsupported configuration format: {0}")]
    UnsupportedConfigFormat(String),

    /// Demand summed over every ordered pair is zero
    #[error("total demand is zero")]
    ZeroDemand,

    /// A demand weight is negative or not a number
    #[error("invalid demand {value} for {origin} -> {destination}")]
    InvalidDemand {
        /// Origin node
        origin: String,
        /// Destination node
        destination: String,
        /// Offending weight
        value: f64,
    },

    /// Draw vector does not cover exactly the edges of the network
    #[error("expected {expected} edge draws, got {actual}")]
    DrawCountMismatch {
        /// Edge count of the network
        expected: usize,
        /// Number of draws supplied
        actual: usize,
    },

    /// TOML configuration parse failure
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML configuration parse failure
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
