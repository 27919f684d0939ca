//! Origin-destination demand and its satisfied fraction
//!
//! Demand is weighted over every ordered pair of nodes, self-pairs included.
//! A self-pair is always satisfied, so under uniform demand a network of `N`
//! nodes never scores below `1/N`.

use crate::cost::Perc;
use crate::error::EngineError;
use perc_network::Network;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Movement demand between two nodes
pub trait Demand: Sync {
    /// Non-negative weight of the ordered pair
    fn demand(&self, origin: &str, destination: &str) -> f64;
}

/// Demand of 1 between every ordered pair
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDemand;

impl Demand for UniformDemand {
    #[inline]
    fn demand(&self, _origin: &str, _destination: &str) -> f64 {
        1.0
    }
}

impl<F> Demand for F
where
    F: Fn(&str, &str) -> f64 + Sync,
{
    fn demand(&self, origin: &str, destination: &str) -> f64 {
        self(origin, destination)
    }
}

/// One explicit weight in a [`DemandTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDemand {
    /// Origin node
    pub from: String,
    /// Destination node
    pub to: String,
    /// Weight of the pair
    pub weight: f64,
}

/// Explicit per-pair weights with a fallback for unlisted pairs
///
/// ```json
/// { "default": 0.0, "pairs": [ { "from": "lobby", "to": "vault", "weight": 5 } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DemandTableFile", into = "DemandTableFile")]
pub struct DemandTable {
    default: f64,
    weights: HashMap<(String, String), f64>,
}

#[derive(Serialize, Deserialize)]
struct DemandTableFile {
    #[serde(default = "default_weight")]
    default: f64,
    #[serde(default)]
    pairs: Vec<PairDemand>,
}

fn default_weight() -> f64 {
    1.0
}

impl From<DemandTableFile> for DemandTable {
    fn from(file: DemandTableFile) -> Self {
        let weights = file
            .pairs
            .into_iter()
            .map(|pair| ((pair.from, pair.to), pair.weight))
            .collect();
        Self {
            default: file.default,
            weights,
        }
    }
}

impl From<DemandTable> for DemandTableFile {
    fn from(table: DemandTable) -> Self {
        let mut pairs: Vec<PairDemand> = table
            .weights
            .into_iter()
            .map(|((from, to), weight)| PairDemand { from, to, weight })
            .collect();
        pairs.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        Self {
            default: table.default,
            pairs,
        }
    }
}

impl DemandTable {
    /// Table where every pair weighs `default`
    #[must_use]
    pub fn new(default: f64) -> Self {
        Self {
            default,
            weights: HashMap::new(),
        }
    }

    /// With an explicit weight for one ordered pair
    #[must_use]
    pub fn with_pair(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.weights.insert((from.into(), to.into()), weight);
        self
    }

    /// Load from a JSON file
    ///
    /// # Errors
    /// Returns [`EngineError::Io`] or [`EngineError::Json`]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Demand for DemandTable {
    fn demand(&self, origin: &str, destination: &str) -> f64 {
        self.weights
            .get(&(origin.to_string(), destination.to_string()))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Dense demand matrix for one network, evaluated once per analysis
#[derive(Debug, Clone, PartialEq)]
pub struct DemandWeights {
    nodes: usize,
    weights: Vec<f64>,
    total: f64,
}

impl DemandWeights {
    /// Evaluate `demand` over every ordered pair of `network`
    ///
    /// # Errors
    /// - [`EngineError::InvalidDemand`] for a negative or NaN weight
    /// - [`EngineError::ZeroDemand`] if the weights sum to zero, which includes
    ///   a network without nodes
    pub fn new(network: &Network, demand: &(impl Demand + ?Sized)) -> Result<Self, EngineError> {
        let nodes = network.node_count();
        let mut weights = Vec::with_capacity(nodes * nodes);
        let mut total = 0.0;
        for origin in network.nodes() {
            for destination in network.nodes() {
                let value = demand.demand(origin, destination);
                if value.is_nan() || value < 0.0 {
                    return Err(EngineError::InvalidDemand {
                        origin: origin.to_string(),
                        destination: destination.to_string(),
                        value,
                    });
                }
                weights.push(value);
                total += value;
            }
        }
        if total <= 0.0 {
            return Err(EngineError::ZeroDemand);
        }
        Ok(Self {
            nodes,
            weights,
            total,
        })
    }

    /// Weight of an ordered pair of node positions
    #[inline]
    #[must_use]
    pub fn weight(&self, origin: usize, destination: usize) -> f64 {
        self.weights[origin * self.nodes + destination]
    }

    /// Sum over every ordered pair
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        self.total
    }
}

impl Perc<'_> {
    /// Reachability indicator `r(o, d)` under this trial's budget
    ///
    /// Self-pairs are always reachable. Unknown identifiers are not.
    #[must_use]
    pub fn reaches(&self, origin: &str, destination: &str) -> bool {
        let network = self.network();
        match (network.node_index(origin), network.node_index(destination)) {
            (Some(o), Some(d)) if o == d => true,
            (Some(o), Some(d)) => self.least_cost(o, d, self.budget()).is_some(),
            _ => false,
        }
    }

    /// Fraction of demand still satisfiable in this trial (`UD`)
    ///
    /// One exhaustive search per origin covers all of its destinations.
    #[must_use]
    pub fn unaffected_demand(&self, weights: &DemandWeights) -> f64 {
        let network = self.network();
        let mut satisfied = 0.0;
        for origin in network.node_indices() {
            let o = origin.index();
            satisfied += weights.weight(o, o);
            for reached in self.reachable_from(origin, self.budget()) {
                if reached != origin {
                    satisfied += weights.weight(o, reached.index());
                }
            }
        }
        satisfied / weights.total()
    }

    /// `UD` evaluated pair by pair with one early-exit search per pair
    ///
    /// Same value as [`Perc::unaffected_demand`]; quadratic in searches.
    #[must_use]
    pub fn unaffected_demand_by_pairs(&self, weights: &DemandWeights) -> f64 {
        let network = self.network();
        let mut satisfied = 0.0;
        for origin in network.node_indices() {
            for destination in network.node_indices() {
                let reached = origin == destination
                    || self
                        .least_cost(origin, destination, self.budget())
                        .is_some();
                if reached {
                    satisfied += weights.weight(origin.index(), destination.index());
                }
            }
        }
        satisfied / weights.total()
    }
}
