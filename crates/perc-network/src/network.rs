//! Immutable network index
//!
//! [`Network`] interns node identifiers into a `petgraph` directed graph and
//! keeps an exact-match index of edges by ordered pair. It is built once
//! through [`NetworkBuilder`] (or [`Network::from_description`]) and never
//! mutated afterwards, so a single instance can be shared by every trial of an
//! analysis.

use crate::description::{EdgeDescription, FailMode, NetworkDescription};
use crate::error::NetworkError;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};

/// Attributes of one directed passage
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Cost charged when passage is observed by a privacy sensor
    pub privacy_cost: f64,
    /// Privacy sensor availability, in percent
    pub priv_avail: f64,
    /// Privilege threshold of the access reader
    pub level: f64,
    /// Access reader availability, in percent
    pub level_avail: f64,
    /// Reader policy on failure
    pub fail_mode: FailMode,
}

impl Edge {
    /// Probability that the access reader is down
    #[inline]
    #[must_use]
    pub fn reader_failure_probability(&self) -> f64 {
        1.0 - self.level_avail / 100.0
    }

    /// Probability that the privacy sensor is down
    #[inline]
    #[must_use]
    pub fn sensor_failure_probability(&self) -> f64 {
        1.0 - self.priv_avail / 100.0
    }
}

impl From<&EdgeDescription> for Edge {
    fn from(description: &EdgeDescription) -> Self {
        Self {
            privacy_cost: description.privacy_cost,
            priv_avail: description.priv_avail,
            level: description.level,
            level_avail: description.level_avail,
            fail_mode: description.fail_mode.clone(),
        }
    }
}

/// Builder for [`Network`]
///
/// Every structural check happens as nodes and edges are added, so
/// [`NetworkBuilder::build`] cannot fail.
///
/// ```rust,ignore
/// let mut builder = NetworkBuilder::new();
/// builder.add_node("A")?;
/// builder.add_node("B")?;
/// builder.add_edge(EdgeDescription::new("A", "B").with_privacy_cost(1.0))?;
/// let network = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    graph: DiGraph<String, Edge>,
    by_id: HashMap<String, NodeIndex>,
    by_pair: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl NetworkBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder sized for the given counts
    #[must_use]
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            by_id: HashMap::with_capacity(nodes),
            by_pair: HashMap::with_capacity(edges),
        }
    }

    /// Declare a node
    ///
    /// # Errors
    /// Returns [`NetworkError::DuplicateNode`] if the identifier is taken
    pub fn add_node(&mut self, id: impl Into<String>) -> Result<NodeIndex, NetworkError> {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            return Err(NetworkError::DuplicateNode(id));
        }
        let index = self.graph.add_node(id.clone());
        self.by_id.insert(id, index);
        Ok(index)
    }

    /// Add a directed edge between two declared nodes
    ///
    /// # Errors
    /// - [`NetworkError::UndeclaredNode`] if an endpoint is unknown
    /// - [`NetworkError::DuplicateEdge`] if the ordered pair already has an edge
    /// - [`NetworkError::InvalidAttribute`] for a negative or NaN cost, or a NaN
    ///   availability or level
    pub fn add_edge(&mut self, description: EdgeDescription) -> Result<EdgeIndex, NetworkError> {
        let from = self.endpoint(&description, &description.from)?;
        let to = self.endpoint(&description, &description.to)?;

        if self.by_pair.contains_key(&(from, to)) {
            return Err(NetworkError::DuplicateEdge {
                from: description.from,
                to: description.to,
            });
        }
        check_attributes(&description)?;

        if let FailMode::Unrecognized(raw) = &description.fail_mode {
            tracing::warn!(
                from = %description.from,
                to = %description.to,
                fail_mode = %raw,
                "unrecognized fail mode, treating as failopen"
            );
        }

        let index = self.graph.add_edge(from, to, Edge::from(&description));
        self.by_pair.insert((from, to), index);
        Ok(index)
    }

    /// Number of declared nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of added edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Freeze into an immutable [`Network`]
    #[must_use]
    pub fn build(self) -> Network {
        Network {
            graph: self.graph,
            by_id: self.by_id,
            by_pair: self.by_pair,
        }
    }

    fn endpoint(&self, description: &EdgeDescription, id: &str) -> Result<NodeIndex, NetworkError> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| NetworkError::UndeclaredNode {
                from: description.from.clone(),
                to: description.to.clone(),
                node: id.to_string(),
            })
    }
}

fn check_attributes(description: &EdgeDescription) -> Result<(), NetworkError> {
    let invalid = |field: &'static str, value: f64| NetworkError::InvalidAttribute {
        from: description.from.clone(),
        to: description.to.clone(),
        field,
        value,
    };

    if description.privacy_cost.is_nan() || description.privacy_cost < 0.0 {
        return Err(invalid("priv", description.privacy_cost));
    }
    for (field, value) in [
        ("privAvail", description.priv_avail),
        ("level", description.level),
        ("levelAvail", description.level_avail),
    ] {
        if value.is_nan() {
            return Err(invalid(field, value));
        }
    }
    Ok(())
}

/// Immutable index over an access-controlled network
#[derive(Debug, Clone)]
pub struct Network {
    graph: DiGraph<String, Edge>,
    by_id: HashMap<String, NodeIndex>,
    by_pair: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl Network {
    /// Build the index from a decoded description
    ///
    /// # Errors
    /// Returns the first structural error found, see [`NetworkBuilder`]
    pub fn from_description(description: &NetworkDescription) -> Result<Self, NetworkError> {
        let mut builder =
            NetworkBuilder::with_capacity(description.nodes.len(), description.edges.len());
        for node in &description.nodes {
            builder.add_node(node.as_str())?;
        }
        for edge in &description.edges {
            builder.add_edge(edge.clone())?;
        }
        let network = builder.build();
        tracing::debug!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            "network index built"
        );
        Ok(network)
    }

    /// Decode and index a JSON description
    ///
    /// # Errors
    /// Returns [`NetworkError::Json`] for malformed JSON and any structural
    /// error from [`Network::from_description`]
    pub fn from_json(text: &str) -> Result<Self, NetworkError> {
        Self::from_description(&NetworkDescription::from_json(text)?)
    }

    /// Attributes of the edge from `from` to `to`
    ///
    /// # Errors
    /// Returns [`NetworkError::EdgeNotFound`] when there is no direct passage
    pub fn edge(&self, from: &str, to: &str) -> Result<&Edge, NetworkError> {
        self.node_index(from)
            .zip(self.node_index(to))
            .and_then(|pair| self.by_pair.get(&pair))
            .map(|&index| &self.graph[index])
            .ok_or_else(|| NetworkError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Nodes with a direct edge from `node` (empty for unknown nodes)
    #[must_use]
    pub fn neighbours(&self, node: &str) -> BTreeSet<&str> {
        self.node_index(node)
            .map(|index| {
                self.graph
                    .neighbors(index)
                    .map(|next| self.graph[next].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Node identifiers in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph
            .node_indices()
            .map(move |index| self.graph[index].as_str())
    }

    /// Edges as `(from, to, attributes)` in declaration order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Edge)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                edge.weight(),
            )
        })
    }

    /// Interned index of a node identifier
    #[inline]
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// Identifier of an interned node
    ///
    /// # Panics
    /// Panics if `index` does not belong to this network
    #[inline]
    #[must_use]
    pub fn node_id(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    /// Interned node indices in declaration order
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Index of the edge for an ordered pair of interned nodes
    #[inline]
    #[must_use]
    pub fn edge_index(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
        self.by_pair.get(&(from, to)).copied()
    }

    /// Attributes of an interned edge
    ///
    /// Edge indices are dense, `0..edge_count()`.
    ///
    /// # Panics
    /// Panics if `index` does not belong to this network
    #[inline]
    #[must_use]
    pub fn edge_at(&self, index: EdgeIndex) -> &Edge {
        &self.graph[index]
    }

    /// Outgoing edges of an interned node as `(target, edge)`
    pub fn successors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
        self.graph
            .edges(node)
            .map(|edge| (edge.target(), edge.id()))
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Convert back into the wire description
    #[must_use]
    pub fn to_description(&self) -> NetworkDescription {
        NetworkDescription {
            nodes: self.nodes().map(str::to_string).collect(),
            edges: self
                .edges()
                .map(|(from, to, edge)| EdgeDescription {
                    from: from.to_string(),
                    to: to.to_string(),
                    privacy_cost: edge.privacy_cost,
                    priv_avail: edge.priv_avail,
                    level: edge.level,
                    level_avail: edge.level_avail,
                    fail_mode: edge.fail_mode.clone(),
                })
                .collect(),
        }
    }

    /// Content hash of the network, hex encoded
    ///
    /// Nodes and edges are hashed in sorted order, so two networks built from
    /// the same lists in different orders share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();

        let mut nodes: Vec<&str> = self.nodes().collect();
        nodes.sort_unstable();
        for node in nodes {
            hasher.update(node.as_bytes());
            hasher.update(&[0]);
        }

        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        for (from, to, edge) in edges {
            hasher.update(from.as_bytes());
            hasher.update(&[0]);
            hasher.update(to.as_bytes());
            hasher.update(&[0]);
            hasher.update(&edge.privacy_cost.to_le_bytes());
            hasher.update(&edge.priv_avail.to_le_bytes());
            hasher.update(&edge.level.to_le_bytes());
            hasher.update(&edge.level_avail.to_le_bytes());
            hasher.update(edge.fail_mode.as_str().as_bytes());
            hasher.update(&[0]);
        }

        hex::encode(hasher.finalize().as_bytes())
    }
}

impl TryFrom<&NetworkDescription> for Network {
    type Error = NetworkError;

    fn try_from(description: &NetworkDescription) -> Result<Self, Self::Error> {
        Self::from_description(description)
    }
}

impl TryFrom<NetworkDescription> for Network {
    type Error = NetworkError;

    fn try_from(description: NetworkDescription) -> Result<Self, Self::Error> {
        Self::from_description(&description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rooms() -> NetworkBuilder {
        let mut builder = NetworkBuilder::new();
        builder.add_node("A").unwrap();
        builder.add_node("B").unwrap();
        builder
    }

    #[test]
    fn test_add_edge_valid() {
        let mut builder = two_rooms();
        builder
            .add_edge(EdgeDescription::new("A", "B").with_privacy_cost(1.0))
            .unwrap();

        let network = builder.build();

        assert_eq!(network.edge_count(), 1);
        assert_eq!(network.edge("A", "B").unwrap().privacy_cost, 1.0);
        assert_eq!(network.neighbours("A"), BTreeSet::from(["B"]));
        assert!(network.neighbours("B").is_empty());
    }

    #[test]
    fn test_add_edge_rejects_duplicate_pair() {
        let mut builder = two_rooms();
        builder.add_edge(EdgeDescription::new("A", "B")).unwrap();

        assert!(matches!(
            builder.add_edge(EdgeDescription::new("A", "B").with_level(0.2)),
            Err(NetworkError::DuplicateEdge { .. })
        ));
        assert_eq!(builder.edge_count(), 1);
    }

    #[test]
    fn test_reverse_pair_is_a_distinct_edge() {
        let mut builder = two_rooms();
        builder.add_edge(EdgeDescription::new("A", "B").with_level(0.5)).unwrap();
        builder.add_edge(EdgeDescription::new("B", "A").with_level(1.0)).unwrap();

        let network = builder.build();

        assert_eq!(network.edge("A", "B").unwrap().level, 0.5);
        assert_eq!(network.edge("B", "A").unwrap().level, 1.0);
    }

    #[test]
    fn test_add_edge_rejects_undeclared_node() {
        let mut builder = two_rooms();

        let err = builder.add_edge(EdgeDescription::new("A", "C")).unwrap_err();

        assert!(matches!(err, NetworkError::UndeclaredNode { ref node, .. } if node == "C"));
    }

    #[test]
    fn test_add_node_rejects_duplicate() {
        let mut builder = two_rooms();
        assert!(matches!(
            builder.add_node("A"),
            Err(NetworkError::DuplicateNode(id)) if id == "A"
        ));
    }

    #[test]
    fn test_add_edge_rejects_negative_cost() {
        let mut builder = two_rooms();
        let err = builder
            .add_edge(EdgeDescription::new("A", "B").with_privacy_cost(-1.0))
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidAttribute { field: "priv", .. }));
    }

    #[test]
    fn test_add_edge_rejects_nan_level() {
        let mut builder = two_rooms();
        let err = builder
            .add_edge(EdgeDescription::new("A", "B").with_level(f64::NAN))
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidAttribute { field: "level", .. }));
    }

    #[test]
    fn test_missing_edge_lookup() {
        let network = two_rooms().build();
        assert!(matches!(
            network.edge("A", "B"),
            Err(NetworkError::EdgeNotFound { .. })
        ));
        assert!(matches!(
            network.edge("A", "nowhere"),
            Err(NetworkError::EdgeNotFound { .. })
        ));
        assert!(network.neighbours("nowhere").is_empty());
    }

    #[test]
    fn test_self_loop_is_allowed() {
        let mut builder = two_rooms();
        builder.add_edge(EdgeDescription::new("A", "A")).unwrap();
        let network = builder.build();
        assert_eq!(network.neighbours("A"), BTreeSet::from(["A"]));
    }

    #[test]
    fn test_failure_probabilities_use_percent() {
        let edge = Edge::from(
            &EdgeDescription::new("A", "B")
                .with_level_avail(75.0)
                .with_priv_avail(10.0),
        );
        assert!((edge.reader_failure_probability() - 0.25).abs() < 1e-12);
        assert!((edge.sensor_failure_probability() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_nodes_keep_declaration_order() {
        let mut builder = NetworkBuilder::new();
        for id in ["z", "a", "m"] {
            builder.add_node(id).unwrap();
        }
        let network = builder.build();
        assert_eq!(network.nodes().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }
}
