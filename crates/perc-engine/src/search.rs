//! Budgeted least-cost reachability
//!
//! Dijkstra's algorithm over the trial's edge costs with the budget acting as
//! a strict ceiling on every tentative distance: a node is only admitted to
//! the frontier while its distance stays below the budget, so any path whose
//! partial cost reaches the budget is never extended. Outdated frontier
//! entries are left in the heap and skipped when popped.

use crate::cost::Perc;
use perc_network::NodeIndex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry, ordered so that `BinaryHeap` pops the cheapest first
#[derive(Debug, Clone, Copy)]
struct Entry {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// In-progress search from one origin
struct Search<'p, 'a> {
    perc: &'p Perc<'a>,
    budget: f64,
    dist: Vec<Option<f64>>,
    frontier: BinaryHeap<Entry>,
}

impl<'p, 'a> Search<'p, 'a> {
    fn new(perc: &'p Perc<'a>, origin: NodeIndex, budget: f64) -> Self {
        let mut dist = vec![None; perc.network().node_count()];
        dist[origin.index()] = Some(0.0);
        let mut frontier = BinaryHeap::new();
        frontier.push(Entry {
            cost: 0.0,
            node: origin,
        });
        Self {
            perc,
            budget,
            dist,
            frontier,
        }
    }

    /// Pop the next node whose distance is final
    fn settle(&mut self) -> Option<Entry> {
        while let Some(entry) = self.frontier.pop() {
            match self.dist[entry.node.index()] {
                Some(best) if best < entry.cost => continue,
                _ => return Some(entry),
            }
        }
        None
    }

    fn relax(&mut self, from: Entry) {
        let network = self.perc.network();
        for (next, edge) in network.successors(from.node) {
            let alt = from.cost + self.perc.cost_of(edge);
            let ceiling = self.dist[next.index()].unwrap_or(self.budget);
            if alt < ceiling {
                self.dist[next.index()] = Some(alt);
                self.frontier.push(Entry {
                    cost: alt,
                    node: next,
                });
            }
        }
    }
}

impl Perc<'_> {
    /// Least cost from `origin` to `destination` strictly below `budget`
    ///
    /// `None` when the destination cannot be reached for less than `budget`,
    /// and always for a non-positive budget. Stops as soon as the destination
    /// is settled.
    #[must_use]
    pub fn least_cost(
        &self,
        origin: NodeIndex,
        destination: NodeIndex,
        budget: f64,
    ) -> Option<f64> {
        if budget <= 0.0 {
            return None;
        }
        let mut search = Search::new(self, origin, budget);
        while let Some(entry) = search.settle() {
            if entry.node == destination {
                return Some(entry.cost);
            }
            search.relax(entry);
        }
        None
    }

    /// [`Perc::least_cost`] by identifier, using this trial's budget
    ///
    /// Unknown identifiers are unreachable.
    #[must_use]
    pub fn least_cost_between(&self, origin: &str, destination: &str) -> Option<f64> {
        let network = self.network();
        let origin = network.node_index(origin)?;
        let destination = network.node_index(destination)?;
        self.least_cost(origin, destination, self.budget())
    }

    /// Every node reachable from `origin` for less than `budget`
    ///
    /// Runs the same search as [`Perc::least_cost`] to exhaustion. The origin
    /// comes first; the result is empty for a non-positive budget.
    #[must_use]
    pub fn reachable_from(&self, origin: NodeIndex, budget: f64) -> Vec<NodeIndex> {
        if budget <= 0.0 {
            return Vec::new();
        }
        let mut search = Search::new(self, origin, budget);
        let mut settled = Vec::new();
        while let Some(entry) = search.settle() {
            settled.push(entry.node);
            search.relax(entry);
        }
        settled
    }
}
