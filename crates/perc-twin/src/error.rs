//! Error types for twin loading and extraction

/// Twin graph error type
#[derive(Debug, thiserror::Error)]
pub enum TwinError {
    /// Input is not valid JSON or lacks a required section
    #[error("malformed twin document: {0}")]
    Json(#[from] serde_json::Error),

    /// Two twins share an identifier
    #[error("duplicate twin: {0}")]
    DuplicateTwin(String),

    /// Two models share an identifier
    #[error("duplicate model: {0}")]
    DuplicateModel(String),

    /// A relationship points at a twin that does not exist
    #[error("relationship {relationship} from {source_id} targets unknown twin {target}")]
    UnknownTwin {
        /// Relationship name
        relationship: String,
        /// Source twin
        source_id: String,
        /// Missing target twin
        target: String,
    },

    /// Two doors join the same ordered pair of spaces
    #[error("doors {first_door} and {second_door} both join {from} -> {to}")]
    DuplicatePassage {
        /// Source space
        from: String,
        /// Target space
        to: String,
        /// Door that produced the pair first
        first_door: String,
        /// Door that produced it again
        second_door: String,
    },

    /// A property has the wrong JSON type
    #[error("twin {twin}: property {property} should be a {expected}")]
    InvalidProperty {
        /// Twin carrying the property
        twin: String,
        /// Property name
        property: String,
        /// Expected JSON type
        expected: &'static str,
    },
}
