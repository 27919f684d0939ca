//! Serialized network description
//!
//! The JSON contract shared by the twin extractor, the CLI and the
//! [`Network`](crate::Network) index:
//!
//! ```json
//! {
//!   "nodes": ["lobby", "office"],
//!   "edges": [
//!     { "from": "lobby", "to": "office",
//!       "priv": 2.0, "privAvail": 95.0,
//!       "level": 0.5, "levelAvail": 99.0,
//!       "failMode": "failclosed" }
//!   ]
//! }
//! ```

use crate::error::NetworkError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

/// Reader policy applied when the access reader is unavailable
///
/// Any value other than `failclosed` behaves like `failopen`. The raw value is
/// kept in [`FailMode::Unrecognized`] so it survives a round trip and can be
/// reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FailMode {
    /// A failed reader grants passage
    FailOpen,
    /// A failed reader denies passage
    #[default]
    FailClosed,
    /// Unknown policy, treated as [`FailMode::FailOpen`]
    Unrecognized(String),
}

impl FailMode {
    /// Whether a failed reader denies passage
    #[inline]
    #[must_use]
    pub fn is_fail_closed(&self) -> bool {
        matches!(self, Self::FailClosed)
    }

    /// Wire name of the policy
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::FailOpen => "failopen",
            Self::FailClosed => "failclosed",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for FailMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "failopen" => Self::FailOpen,
            "failclosed" => Self::FailClosed,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<&str> for FailMode {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<FailMode> for String {
    fn from(mode: FailMode) -> Self {
        match mode {
            FailMode::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed passage between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescription {
    /// Source node identifier
    pub from: String,
    /// Target node identifier
    pub to: String,
    /// Cost charged when passage is observed by a privacy sensor
    #[serde(rename = "priv")]
    pub privacy_cost: f64,
    /// Privacy sensor availability, in percent
    pub priv_avail: f64,
    /// Privilege threshold of the access reader, in `[0, 1]`
    pub level: f64,
    /// Access reader availability, in percent
    pub level_avail: f64,
    /// Reader policy on failure (`failopen` or `failclosed`)
    #[schemars(with = "String")]
    pub fail_mode: FailMode,
}

impl EdgeDescription {
    /// Edge with no sensor cost behind an always-available reader that only
    /// lets holders of privilege above `level` pass
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            privacy_cost: 0.0,
            priv_avail: 100.0,
            level: 1.0,
            level_avail: 100.0,
            fail_mode: FailMode::FailClosed,
        }
    }

    /// With privacy cost
    #[inline]
    #[must_use]
    pub fn with_privacy_cost(mut self, cost: f64) -> Self {
        self.privacy_cost = cost;
        self
    }

    /// With privacy sensor availability (percent)
    #[inline]
    #[must_use]
    pub fn with_priv_avail(mut self, percent: f64) -> Self {
        self.priv_avail = percent;
        self
    }

    /// With access level threshold
    #[inline]
    #[must_use]
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    /// With access reader availability (percent)
    #[inline]
    #[must_use]
    pub fn with_level_avail(mut self, percent: f64) -> Self {
        self.level_avail = percent;
        self
    }

    /// With fail mode
    #[inline]
    #[must_use]
    pub fn with_fail_mode(mut self, mode: impl Into<FailMode>) -> Self {
        self.fail_mode = mode.into();
        self
    }
}

/// Node and edge lists as exchanged on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkDescription {
    /// Node identifiers
    pub nodes: Vec<String>,
    /// Directed edges
    pub edges: Vec<EdgeDescription>,
}

impl NetworkDescription {
    /// Decode from a JSON string
    ///
    /// # Errors
    /// Returns [`NetworkError::Json`] if the text is not a network description
    pub fn from_json(text: &str) -> Result<Self, NetworkError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode from a JSON reader
    ///
    /// # Errors
    /// Returns [`NetworkError::Json`] on I/O or decoding failure
    pub fn from_reader(reader: impl Read) -> Result<Self, NetworkError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Encode as indented JSON
    ///
    /// # Errors
    /// Returns [`NetworkError::Json`] if a value cannot be represented
    pub fn to_json_pretty(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON schema of the description format
    #[must_use]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(NetworkDescription)
    }
}
