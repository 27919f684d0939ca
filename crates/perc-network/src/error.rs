//! Error types for network construction and lookup
//!
//! Every variant except [`NetworkError::EdgeNotFound`] is a configuration
//! error: it is raised while the index is built, before any simulation runs.

/// Network construction and lookup errors
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The same node identifier was declared twice
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// More than one edge for the same ordered pair
    #[error("duplicate edge: {from} -> {to}")]
    DuplicateEdge {
        /// Source node
        from: String,
        /// Target node
        to: String,
    },

    /// Edge endpoint missing from the node list
    #[error("edge {from} -> {to} references undeclared node {node}")]
    UndeclaredNode {
        /// Source node
        from: String,
        /// Target node
        to: String,
        /// The endpoint that was not declared
        node: String,
    },

    /// Edge attribute outside its admissible domain
    #[error("invalid {field} on edge {from} -> {to}: {value}")]
    InvalidAttribute {
        /// Source node
        from: String,
        /// Target node
        to: String,
        /// JSON name of the offending attribute
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// No direct passage between the two nodes
    #[error("no edge from {from} to {to}")]
    EdgeNotFound {
        /// Source node
        from: String,
        /// Target node
        to: String,
    },

    /// The network description could not be decoded
    #[error("malformed network description: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    /// Check if the error rejects the network as a whole
    ///
    /// Lookups of absent edges are ordinary outcomes; everything else means
    /// the description must be fixed before an analysis can run.
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::EdgeNotFound { .. })
    }
}
