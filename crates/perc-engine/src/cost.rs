//! Stochastic edge cost model
//!
//! One [`Perc`] instance is one trial: a network, an access threshold `rho`,
//! one [`Draw`] per edge and a budget. The cost of an edge is a pure function
//! of those inputs, evaluated the first time the search touches the edge and
//! memoized for the rest of the trial.

use crate::error::EngineError;
use perc_network::{Edge, EdgeIndex, Network, NetworkError};
use rand::Rng;
use std::cell::OnceCell;

/// Uniform draws in `[0, 1)` deciding component failures on one edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    /// Decides whether the access reader fails (`z0`)
    pub reader: f64,
    /// Decides whether the privacy sensor fails (`z1`)
    pub sensor: f64,
}

impl Draw {
    /// Draw both values from `rng`, reader first
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let reader = rng.gen::<f64>();
        let sensor = rng.gen::<f64>();
        Self { reader, sensor }
    }
}

/// One [`Draw`] per edge of a network, indexed by edge index
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDraws(Vec<Draw>);

impl EdgeDraws {
    /// Fresh independent draws for every edge, in edge order
    pub fn sample<R: Rng + ?Sized>(network: &Network, rng: &mut R) -> Self {
        Self((0..network.edge_count()).map(|_| Draw::sample(rng)).collect())
    }

    /// The same draw on every edge
    #[must_use]
    pub fn constant(network: &Network, draw: Draw) -> Self {
        Self(vec![draw; network.edge_count()])
    }

    /// Wrap explicit draws
    #[must_use]
    pub fn from_vec(draws: Vec<Draw>) -> Self {
        Self(draws)
    }

    /// Draw for an edge
    ///
    /// # Panics
    /// Panics if `edge` is out of range
    #[inline]
    #[must_use]
    pub fn get(&self, edge: EdgeIndex) -> Draw {
        self.0[edge.index()]
    }

    /// Number of draws
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no draws
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Traversal cost of `edge` for threshold `rho` and the trial's `draw`
///
/// Infinite when the reader denies passage, zero when passage goes unobserved
/// because the sensor is down, the edge's privacy cost otherwise.
#[must_use]
pub fn edge_cost(edge: &Edge, rho: f64, draw: Draw) -> f64 {
    let access_permission = edge.level > rho;
    let access_failure = draw.reader < edge.reader_failure_probability();

    let has_access = if edge.fail_mode.is_fail_closed() {
        access_permission && !access_failure
    } else {
        access_permission || access_failure
    };
    if !has_access {
        return f64::INFINITY;
    }

    let sensor_failure = draw.sensor < edge.sensor_failure_probability();
    if sensor_failure {
        0.0
    } else {
        edge.privacy_cost
    }
}

/// Cost model instance for one trial
#[derive(Debug)]
pub struct Perc<'a> {
    network: &'a Network,
    rho: f64,
    draws: EdgeDraws,
    budget: f64,
    costs: Vec<OnceCell<f64>>,
}

impl<'a> Perc<'a> {
    /// Tie a network to one trial's threshold, draws and budget
    ///
    /// # Errors
    /// Returns [`EngineError::DrawCountMismatch`] unless there is exactly one
    /// draw per edge
    pub fn new(
        network: &'a Network,
        rho: f64,
        draws: EdgeDraws,
        budget: f64,
    ) -> Result<Self, EngineError> {
        if draws.len() != network.edge_count() {
            return Err(EngineError::DrawCountMismatch {
                expected: network.edge_count(),
                actual: draws.len(),
            });
        }
        Ok(Self::with_draws(network, rho, draws, budget))
    }

    /// Trial with fresh draws for every edge taken from `rng`
    pub fn sample<R: Rng + ?Sized>(
        network: &'a Network,
        rho: f64,
        budget: f64,
        rng: &mut R,
    ) -> Self {
        Self::with_draws(network, rho, EdgeDraws::sample(network, rng), budget)
    }

    fn with_draws(network: &'a Network, rho: f64, draws: EdgeDraws, budget: f64) -> Self {
        Self {
            network,
            rho,
            draws,
            budget,
            costs: std::iter::repeat_with(OnceCell::new)
                .take(network.edge_count())
                .collect(),
        }
    }

    /// The indexed network
    #[inline]
    #[must_use]
    pub fn network(&self) -> &'a Network {
        self.network
    }

    /// Access threshold of this trial
    #[inline]
    #[must_use]
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Budget of this trial
    #[inline]
    #[must_use]
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Cost of an interned edge, computed on first use
    #[inline]
    pub fn cost_of(&self, edge: EdgeIndex) -> f64 {
        *self.costs[edge.index()].get_or_init(|| {
            edge_cost(self.network.edge_at(edge), self.rho, self.draws.get(edge))
        })
    }

    /// Cost of the edge from `from` to `to`
    ///
    /// # Errors
    /// Returns [`NetworkError::EdgeNotFound`] if there is no such edge
    pub fn cost(&self, from: &str, to: &str) -> Result<f64, NetworkError> {
        self.network
            .node_index(from)
            .zip(self.network.node_index(to))
            .and_then(|(a, b)| self.network.edge_index(a, b))
            .map(|edge| self.cost_of(edge))
            .ok_or_else(|| NetworkError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perc_network::{EdgeDescription, FailMode};

    fn edge(level: f64, level_avail: f64, priv_avail: f64, mode: FailMode) -> Edge {
        Edge::from(
            &EdgeDescription::new("A", "B")
                .with_privacy_cost(3.0)
                .with_level(level)
                .with_level_avail(level_avail)
                .with_priv_avail(priv_avail)
                .with_fail_mode(mode),
        )
    }

    const CALM: Draw = Draw {
        reader: 0.99,
        sensor: 0.99,
    };

    #[test]
    fn test_permitted_and_observed_costs_privacy() {
        let e = edge(0.5, 100.0, 100.0, FailMode::FailClosed);
        assert_eq!(edge_cost(&e, 0.25, CALM), 3.0);
    }

    #[test]
    fn test_level_must_strictly_exceed_rho() {
        let e = edge(0.5, 100.0, 100.0, FailMode::FailClosed);
        assert_eq!(edge_cost(&e, 0.5, CALM), f64::INFINITY);
        assert_eq!(edge_cost(&e, 0.75, CALM), f64::INFINITY);
    }

    #[test]
    fn test_failed_sensor_makes_passage_free() {
        let e = edge(0.5, 100.0, 40.0, FailMode::FailClosed);
        let draw = Draw { reader: 0.99, sensor: 0.59 };
        assert_eq!(edge_cost(&e, 0.25, draw), 0.0);
        let draw = Draw { reader: 0.99, sensor: 0.61 };
        assert_eq!(edge_cost(&e, 0.25, draw), 3.0);
    }

    #[test]
    fn test_fail_closed_reader_failure_denies() {
        let e = edge(0.5, 90.0, 100.0, FailMode::FailClosed);
        let failed = Draw { reader: 0.05, sensor: 0.99 };
        assert_eq!(edge_cost(&e, 0.25, failed), f64::INFINITY);
        let working = Draw { reader: 0.15, sensor: 0.99 };
        assert_eq!(edge_cost(&e, 0.25, working), 3.0);
    }

    #[test]
    fn test_fail_open_reader_failure_grants() {
        let e = edge(0.0, 90.0, 100.0, FailMode::FailOpen);
        let failed = Draw { reader: 0.05, sensor: 0.99 };
        assert_eq!(edge_cost(&e, 0.25, failed), 3.0);
        let working = Draw { reader: 0.15, sensor: 0.99 };
        assert_eq!(edge_cost(&e, 0.25, working), f64::INFINITY);
    }

    #[test]
    fn test_unrecognized_mode_behaves_as_fail_open() {
        let e = edge(0.0, 90.0, 100.0, FailMode::Unrecognized("bogus".to_string()));
        let failed = Draw { reader: 0.05, sensor: 0.99 };
        assert_eq!(edge_cost(&e, 0.25, failed), 3.0);
    }

    #[test]
    fn test_fail_open_dead_reader_always_passable() {
        let e = edge(0.0, 0.0, 100.0, FailMode::FailOpen);
        for reader in [0.0, 0.5, 0.999_999] {
            for rho in [0.0, 0.5, 2.0] {
                let draw = Draw { reader, sensor: 0.5 };
                assert!(edge_cost(&e, rho, draw).is_finite());
            }
        }
    }

    #[test]
    fn test_fail_closed_zero_level_never_passable() {
        for level_avail in [0.0, 50.0, 100.0] {
            let e = edge(0.0, level_avail, 100.0, FailMode::FailClosed);
            for reader in [0.0, 0.5, 0.999] {
                let draw = Draw { reader, sensor: 0.5 };
                assert_eq!(edge_cost(&e, 0.0, draw), f64::INFINITY);
            }
        }
    }

    #[test]
    fn test_negative_rho_grants_permission_on_zero_level() {
        let e = edge(0.0, 100.0, 100.0, FailMode::FailClosed);
        assert_eq!(edge_cost(&e, -0.5, Draw { reader: 0.0, sensor: 0.0 }), 3.0);
    }

    #[test]
    fn test_perc_rejects_wrong_draw_count() {
        let network = perc_network::Network::from_json(
            r#"{"nodes": ["A", "B"], "edges": [
                {"from": "A", "to": "B", "priv": 1, "privAvail": 100,
                 "level": 1, "levelAvail": 100, "failMode": "failclosed"}
            ]}"#,
        )
        .unwrap();

        let result = Perc::new(&network, 0.5, EdgeDraws::from_vec(Vec::new()), 1.0);

        assert!(matches!(
            result,
            Err(EngineError::DrawCountMismatch { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn test_sampled_trial_is_reproducible() {
        use rand::{rngs::StdRng, SeedableRng};

        let network = perc_network::Network::from_json(
            r#"{"nodes": ["A", "B"], "edges": [
                {"from": "A", "to": "B", "priv": 2, "privAvail": 50,
                 "level": 1, "levelAvail": 50, "failMode": "failopen"}
            ]}"#,
        )
        .unwrap();
        let mut first = StdRng::seed_from_u64(11);
        let mut second = StdRng::seed_from_u64(11);

        let a = Perc::sample(&network, 0.5, 3.0, &mut first);
        let b = Perc::sample(&network, 0.5, 3.0, &mut second);

        assert_eq!(a.cost("A", "B").unwrap(), b.cost("A", "B").unwrap());
        assert_eq!(a.budget(), 3.0);
    }

    #[test]
    fn test_perc_cost_by_identifier() {
        let network = perc_network::Network::from_json(
            r#"{"nodes": ["A", "B"], "edges": [
                {"from": "A", "to": "B", "priv": 2, "privAvail": 100,
                 "level": 1, "levelAvail": 100, "failMode": "failclosed"}
            ]}"#,
        )
        .unwrap();
        let perc = Perc::new(&network, 0.5, EdgeDraws::constant(&network, CALM), 5.0).unwrap();

        assert_eq!(perc.cost("A", "B").unwrap(), 2.0);
        assert!(matches!(
            perc.cost("B", "A"),
            Err(NetworkError::EdgeNotFound { .. })
        ));
    }
}
