//! Budget sweep
//!
//! Runs the estimator once per integer budget of the configured range and
//! collects the rows into a [`ResilienceReport`].

use crate::config::EngineConfig;
use crate::demand::{Demand, UniformDemand};
use crate::error::EngineError;
use crate::estimator::Estimator;
use crate::report::{ResilienceReport, ResilienceRow};
use perc_network::Network;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared flag that stops a sweep before its next budget
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an untripped flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resilience of `network` over the configured budgets under uniform demand
///
/// # Errors
/// See [`percolation_with`]
pub fn percolation(
    network: &Network,
    config: &EngineConfig,
) -> Result<ResilienceReport, EngineError> {
    percolation_with(network, config, &UniformDemand, &CancelFlag::new())
}

/// Resilience of `network` over the configured budgets
///
/// `cancel` is checked before every budget; rows already computed are kept
/// and the report is marked incomplete.
///
/// # Errors
/// Returns [`EngineError::InvalidConfig`], [`EngineError::ZeroDemand`] or
/// [`EngineError::InvalidDemand`] before any trial runs
pub fn percolation_with(
    network: &Network,
    config: &EngineConfig,
    demand: &(impl Demand + ?Sized),
    cancel: &CancelFlag,
) -> Result<ResilienceReport, EngineError> {
    let seed = config.seed.unwrap_or_else(|| {
        let seed = rand::random();
        info!(seed, "no seed configured, drew a random one");
        seed
    });
    let estimator = Estimator::new(network, demand, config, seed)?;

    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        integral_steps = config.integral_steps,
        rand_steps = config.rand_steps,
        min_budget = config.min_budget,
        max_budget = config.max_budget,
        "starting percolation sweep"
    );

    let mut report = ResilienceReport::new(network.fingerprint(), seed, config);
    for budget in config.budgets() {
        if cancel.is_cancelled() {
            warn!(budget, completed = report.rows.len(), "sweep cancelled");
            report.completed = false;
            return Ok(report);
        }
        let started = Instant::now();
        let alpha = estimator.alpha(f64::from(budget));
        info!(
            budget,
            alpha,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "budget complete"
        );
        report.rows.push(ResilienceRow { budget, alpha });
    }
    report.completed = true;
    Ok(report)
}
