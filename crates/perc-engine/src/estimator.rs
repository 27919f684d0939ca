//! Monte-Carlo resilience estimator
//!
//! `alpha(budget)` is the expected unaffected demand integrated over the access
//! threshold `rho` in `[0, 1]`, approximated with the midpoint rule. Each cell
//! of the rule averages independent trials; each trial owns a `StdRng` seeded
//! from `(seed, step, trial)`, so an estimate depends only on its inputs and
//! never on how trials are scheduled across threads.
//!
//! The budget is not part of the trial seed. Every budget of a sweep sees the
//! same failures, and since a larger budget never prunes a path the smaller
//! one kept, `alpha` is non-decreasing in the budget for any seed.

use crate::config::EngineConfig;
use crate::cost::Perc;
use crate::demand::{Demand, DemandWeights, UniformDemand};
use crate::error::EngineError;
use perc_network::Network;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

/// Midpoints of `steps` equal cells over `[0, 1]`
#[must_use]
pub fn rho_midpoints(steps: usize) -> Vec<f64> {
    let delta = 1.0 / steps as f64;
    (0..steps).map(|k| delta * k as f64 + delta / 2.0).collect()
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Seed of one trial's random source, shared by every budget
#[must_use]
pub fn trial_seed(seed: u64, step: usize, trial: usize) -> u64 {
    let mut h = splitmix64(seed);
    h = splitmix64(h ^ step as u64);
    splitmix64(h ^ trial as u64)
}

/// Resilience estimator bound to one network and demand
#[derive(Debug, Clone)]
pub struct Estimator<'a> {
    network: &'a Network,
    weights: DemandWeights,
    integral_steps: usize,
    rand_steps: usize,
    seed: u64,
    parallel: bool,
}

impl<'a> Estimator<'a> {
    /// Estimator under caller-supplied demand
    ///
    /// Uses the step counts and parallelism of `config`; `seed` replaces
    /// whatever seed `config` carries.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidConfig`] for zero steps, and
    /// [`EngineError::ZeroDemand`] or [`EngineError::InvalidDemand`] for
    /// unusable demand
    pub fn new(
        network: &'a Network,
        demand: &(impl Demand + ?Sized),
        config: &EngineConfig,
        seed: u64,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let weights = DemandWeights::new(network, demand)?;
        Ok(Self {
            network,
            weights,
            integral_steps: config.integral_steps,
            rand_steps: config.rand_steps,
            seed,
            parallel: config.parallel,
        })
    }

    /// The network under analysis
    #[inline]
    #[must_use]
    pub fn network(&self) -> &'a Network {
        self.network
    }

    /// Base seed of every trial
    #[inline]
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `UD` of a single trial
    #[must_use]
    pub fn sample(&self, budget: f64, rho: f64, step: usize, trial: usize) -> f64 {
        let mut rng = StdRng::seed_from_u64(trial_seed(self.seed, step, trial));
        Perc::sample(self.network, rho, budget, &mut rng).unaffected_demand(&self.weights)
    }

    /// Mean `UD` over the trials of one `rho` cell
    ///
    /// Samples are collected in trial order before summing, so the parallel
    /// and sequential paths agree bit for bit.
    #[must_use]
    pub fn expected_unaffected_demand(&self, budget: f64, rho: f64, step: usize) -> f64 {
        let samples: Vec<f64> = if self.parallel {
            (0..self.rand_steps)
                .into_par_iter()
                .map(|trial| self.sample(budget, rho, step, trial))
                .collect()
        } else {
            (0..self.rand_steps)
                .map(|trial| self.sample(budget, rho, step, trial))
                .collect()
        };
        samples.iter().sum::<f64>() / self.rand_steps as f64
    }

    /// Resilience at `budget`
    #[must_use]
    pub fn alpha(&self, budget: f64) -> f64 {
        let delta = 1.0 / self.integral_steps as f64;
        let mut integral = 0.0;
        for (step, rho) in rho_midpoints(self.integral_steps).into_iter().enumerate() {
            let expected = self.expected_unaffected_demand(budget, rho, step);
            debug!(budget, rho, expected, "rho step complete");
            integral += expected * delta;
        }
        integral
    }
}

/// Resilience of `network` at `budget` under uniform demand
///
/// # Errors
/// Returns [`EngineError::InvalidConfig`] for zero steps and
/// [`EngineError::ZeroDemand`] for a network without nodes
pub fn alpha(
    network: &Network,
    budget: f64,
    integral_steps: usize,
    rand_steps: usize,
    seed: u64,
) -> Result<f64, EngineError> {
    let config = EngineConfig::default()
        .with_integral_steps(integral_steps)
        .with_rand_steps(rand_steps);
    Ok(Estimator::new(network, &UniformDemand, &config, seed)?.alpha(budget))
}
