//! Engine configuration
//!
//! Loaded from TOML or YAML; every field has a default so a file only needs
//! the values it changes:
//!
//! ```toml
//! integral_steps = 8
//! rand_steps = 500
//! max_budget = 24
//! seed = 7
//! ```

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Parameters of a resilience sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Midpoint-rule cells over the access threshold `rho`
    pub integral_steps: usize,
    /// Monte-Carlo trials per `rho` cell
    pub rand_steps: usize,
    /// First budget of the sweep
    pub min_budget: u32,
    /// Last budget of the sweep (inclusive)
    pub max_budget: u32,
    /// Base seed; a random one is drawn and logged when absent
    pub seed: Option<u64>,
    /// Evaluate the trials of one cell on the rayon pool
    pub parallel: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With quadrature resolution
    #[inline]
    #[must_use]
    pub fn with_integral_steps(mut self, steps: usize) -> Self {
        self.integral_steps = steps;
        self
    }

    /// With Monte-Carlo sample count
    #[inline]
    #[must_use]
    pub fn with_rand_steps(mut self, steps: usize) -> Self {
        self.rand_steps = steps;
        self
    }

    /// With budget range
    #[inline]
    #[must_use]
    pub fn with_budgets(mut self, budgets: RangeInclusive<u32>) -> Self {
        self.min_budget = *budgets.start();
        self.max_budget = *budgets.end();
        self
    }

    /// With fixed seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// With or without parallel trials
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Budgets to sweep
    #[inline]
    #[must_use]
    pub fn budgets(&self) -> RangeInclusive<u32> {
        self.min_budget..=self.max_budget
    }

    /// Check that the configuration can drive an estimate
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidConfig`] for zero steps or an empty budget
    /// range
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.integral_steps == 0 {
            return Err(EngineError::InvalidConfig(
                "integral_steps must be at least 1".to_string(),
            ));
        }
        if self.rand_steps == 0 {
            return Err(EngineError::InvalidConfig(
                "rand_steps must be at least 1".to_string(),
            ));
        }
        if self.min_budget > self.max_budget {
            return Err(EngineError::InvalidConfig(format!(
                "min_budget {} exceeds max_budget {}",
                self.min_budget, self.max_budget
            )));
        }
        Ok(())
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`EngineError::Toml`] on malformed input or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// Returns [`EngineError::Yaml`] on malformed input or unknown keys
    pub fn from_yaml_str(text: &str) -> Result<Self, EngineError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns [`EngineError::Io`] if the file cannot be read,
    /// [`EngineError::UnsupportedConfigFormat`] for other extensions, and the
    /// parser's error otherwise
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let parse = match extension.as_str() {
            "toml" => Self::from_toml_str,
            "yaml" | "yml" => Self::from_yaml_str,
            _ => {
                return Err(EngineError::UnsupportedConfigFormat(
                    path.display().to_string(),
                ))
            }
        };
        parse(&std::fs::read_to_string(path)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            integral_steps: 4,
            rand_steps: 1000,
            min_budget: 0,
            max_budget: 16,
            seed: None,
            parallel: true,
        }
    }
}
