//! Resilience report
//!
//! Two renderings: a CSV text table
//!
//! ```text
//! budget, alpha
//!      0, 0.250
//!      1, 0.417
//! ```
//!
//! and a mapping `{"alpha_0": 0.25, "alpha_1": 0.4166}` in budget order.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Resilience at one budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceRow {
    /// Privacy budget
    pub budget: u32,
    /// Estimated resilience
    pub alpha: f64,
}

/// Outcome of a budget sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceReport {
    /// Rows in budget order
    pub rows: Vec<ResilienceRow>,
    /// Fingerprint of the analysed network
    pub fingerprint: String,
    /// Base seed of every trial
    pub seed: u64,
    /// Midpoint-rule cells
    pub integral_steps: usize,
    /// Trials per cell
    pub rand_steps: usize,
    /// False if the sweep was cancelled before its last budget
    pub completed: bool,
    /// When the sweep started
    pub generated_at: DateTime<Utc>,
}

impl ResilienceReport {
    /// Empty report for a sweep about to start
    #[must_use]
    pub fn new(fingerprint: String, seed: u64, config: &EngineConfig) -> Self {
        Self {
            rows: Vec::new(),
            fingerprint,
            seed,
            integral_steps: config.integral_steps,
            rand_steps: config.rand_steps,
            completed: false,
            generated_at: Utc::now(),
        }
    }

    /// Resilience at `budget`, if the sweep reached it
    #[must_use]
    pub fn alpha(&self, budget: u32) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.budget == budget)
            .map(|row| row.alpha)
    }

    /// CSV text rendering
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from("budget, alpha\n");
        for row in &self.rows {
            let _ = writeln!(out, "{:6}, {:.3}", row.budget, row.alpha);
        }
        out
    }

    /// `alpha_<budget>` mapping in budget order
    #[must_use]
    pub fn alpha_map(&self) -> IndexMap<String, f64> {
        self.rows
            .iter()
            .map(|row| (format!("alpha_{}", row.budget), row.alpha))
            .collect()
    }

    /// Pretty JSON of [`ResilienceReport::alpha_map`]
    ///
    /// # Errors
    /// Returns an error if a value cannot be encoded
    pub fn alpha_map_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.alpha_map())
    }

    /// Pretty JSON of the whole report
    ///
    /// # Errors
    /// Returns an error if a value cannot be encoded
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
