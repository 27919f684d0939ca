//! Access-network extraction
//!
//! Spaces become nodes and doors become edges. A door's surveillance assets
//! decide the privacy cost and sensor availability of its passages; its access
//! readers decide the required level, reader availability and fail mode.

use crate::error::TwinError;
use crate::graph::{Twin, TwinGraph};
use indexmap::IndexMap;
use perc_network::{EdgeDescription, FailMode, NetworkDescription};
use std::collections::HashMap;
use tracing::debug;

/// Model identifiers and access-level mapping used during extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Model of twins that become nodes
    pub space_model: String,
    /// Model of twins that become edges
    pub door_model: String,
    /// Model of privacy-relevant sensors serving a door
    pub surveillance_model: String,
    /// Model of access readers serving a door
    pub reader_model: String,
    /// Reader `accessLevel` name to required level; unlisted names map to 0
    pub access_levels: IndexMap<String, f64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            space_model: "dtmi:digitaltwins:rec_3_3:core:Space;1".to_string(),
            door_model: "dtmi:digitaltwins:rec_3_3:asset:Door;1".to_string(),
            surveillance_model: "dtmi:au:edu:deakin:a2i2:SurveillanceAsset;1".to_string(),
            reader_model: "dtmi:au:edu:deakin:a2i2:AccessReader;1".to_string(),
            access_levels: [("visitor", 0.75), ("staff", 0.5), ("security", 0.25)]
                .into_iter()
                .map(|(name, level)| (name.to_string(), level))
                .collect(),
        }
    }
}

impl ExtractorConfig {
    /// With a different level for an access-level name
    #[must_use]
    pub fn with_access_level(mut self, name: impl Into<String>, level: f64) -> Self {
        self.access_levels.insert(name.into(), level);
        self
    }

    fn level_of(&self, name: &str) -> f64 {
        self.access_levels.get(name).copied().unwrap_or(0.0)
    }
}

/// Passage attributes shared by every edge a door produces
#[derive(Debug, Clone, PartialEq)]
struct Passage {
    privacy_cost: f64,
    priv_avail: f64,
    level: f64,
    level_avail: f64,
    fail_mode: FailMode,
}

impl Passage {
    fn of(graph: &TwinGraph, door: &Twin, config: &ExtractorConfig) -> Result<Self, TwinError> {
        let mut privacy_cost = 0.0;
        let mut priv_avail = 1.0;
        for sensor in graph.rel_targets("servedBy", &door.id, &config.surveillance_model) {
            privacy_cost += sensor.number("privacyCost")?.unwrap_or(0.0);
            priv_avail *= sensor.number("availability")?.map_or(1.0, |a| a / 100.0);
        }

        let mut level: f64 = 1.0;
        let mut level_avail = 1.0;
        let mut fail_mode = FailMode::FailClosed;
        for reader in graph.rel_targets("servedBy", &door.id, &config.reader_model) {
            if let Some(name) = reader.string("accessLevel")? {
                level = level.min(config.level_of(name));
            }
            level_avail *= reader.number("availability")?.map_or(1.0, |a| a / 100.0);
            if reader.string("failMode")? == Some("failopen") {
                fail_mode = FailMode::FailOpen;
            }
        }

        Ok(Self {
            privacy_cost,
            priv_avail: priv_avail * 100.0,
            level,
            level_avail: level_avail * 100.0,
            fail_mode,
        })
    }

    fn edge(&self, from: &str, to: &str) -> EdgeDescription {
        EdgeDescription::new(from, to)
            .with_privacy_cost(self.privacy_cost)
            .with_priv_avail(self.priv_avail)
            .with_level(self.level)
            .with_level_avail(self.level_avail)
            .with_fail_mode(self.fail_mode.clone())
    }

    /// Leaving through a door needs no credential
    fn exit(&self, from: &str, to: &str) -> EdgeDescription {
        self.edge(from, to).with_level(1.0).with_level_avail(100.0)
    }
}

/// Build the access network of `graph`
///
/// Every door yields one edge per (`fromSpace`, `toSpace`) pair of spaces and,
/// unless its `direction` says otherwise, the matching exit edge in the
/// reverse direction. No two doors may join the same ordered pair.
///
/// # Errors
/// - [`TwinError::InvalidProperty`] when a property read during extraction
///   has the wrong JSON type
/// - [`TwinError::DuplicatePassage`] when a second door yields an ordered pair
///   another door already joins
pub fn extract(
    graph: &TwinGraph,
    config: &ExtractorConfig,
) -> Result<NetworkDescription, TwinError> {
    let nodes: Vec<String> = graph
        .twins(Some(config.space_model.as_str()))
        .map(|space| space.id.clone())
        .collect();

    let mut edges = Vec::new();
    let mut owners: HashMap<(String, String), String> = HashMap::new();
    let mut push = |edge: EdgeDescription, door: &str| {
        let pair = (edge.from.clone(), edge.to.clone());
        if let Some(first) = owners.get(&pair) {
            return Err(TwinError::DuplicatePassage {
                from: edge.from,
                to: edge.to,
                first_door: first.clone(),
                second_door: door.to_string(),
            });
        }
        owners.insert(pair, door.to_string());
        edges.push(edge);
        Ok(())
    };

    for door in graph.twins(Some(config.door_model.as_str())) {
        let passage = Passage::of(graph, door, config)?;
        let two_way = door.string("direction")?.map_or(true, |d| d == "twoway");
        let from: Vec<&Twin> = graph
            .rel_targets("fromSpace", &door.id, &config.space_model)
            .collect();
        let to: Vec<&Twin> = graph
            .rel_targets("toSpace", &door.id, &config.space_model)
            .collect();

        for a in &from {
            for b in &to {
                push(passage.edge(&a.id, &b.id), &door.id)?;
            }
        }
        if two_way {
            for a in &from {
                for b in &to {
                    push(passage.exit(&b.id, &a.id), &door.id)?;
                }
            }
        }
    }

    debug!(nodes = nodes.len(), edges = edges.len(), "extracted network");
    Ok(NetworkDescription { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            space_model: "space".to_string(),
            door_model: "door".to_string(),
            surveillance_model: "camera".to_string(),
            reader_model: "reader".to_string(),
            ..ExtractorConfig::default()
        }
    }

    fn graph(twins: &str, relationships: &str) -> TwinGraph {
        let models = ["space", "door", "camera", "reader"]
            .map(|id| format!(r#"{{"@id": "{id}"}}"#))
            .join(",");
        let doc = format!(
            r#"{{"digitalTwinsGraph": {{
                    "digitalTwins": [{twins}],
                    "relationships": [{relationships}]
                }},
                "digitalTwinsModels": [{models}]}}"#
        );
        TwinGraph::from_json(&doc).unwrap()
    }

    fn rel(name: &str, source: &str, target: &str) -> String {
        format!(
            r#"{{"$relationshipName": "{name}", "$sourceId": "{source}", "$targetId": "{target}"}}"#
        )
    }

    #[test]
    fn test_bare_door_is_free_and_open() {
        let g = graph(
            r#"{"$dtId": "a", "$metadata": {"$model": "space"}},
               {"$dtId": "b", "$metadata": {"$model": "space"}},
               {"$dtId": "d", "$metadata": {"$model": "door"}, "direction": "oneway"}"#,
            &[rel("fromSpace", "d", "a"), rel("toSpace", "d", "b")].join(","),
        );
        let network = extract(&g, &config()).unwrap();

        assert_eq!(network.nodes, vec!["a", "b"]);
        assert_eq!(network.edges, vec![EdgeDescription::new("a", "b")]);
    }

    #[test]
    fn test_door_aggregates_its_devices() {
        let g = graph(
            r#"{"$dtId": "a", "$metadata": {"$model": "space"}},
               {"$dtId": "b", "$metadata": {"$model": "space"}},
               {"$dtId": "d", "$metadata": {"$model": "door"}},
               {"$dtId": "c1", "$metadata": {"$model": "camera"},
                "privacyCost": 2, "availability": 50},
               {"$dtId": "c2", "$metadata": {"$model": "camera"}, "privacyCost": 3},
               {"$dtId": "r1", "$metadata": {"$model": "reader"},
                "accessLevel": "staff", "availability": 80},
               {"$dtId": "r2", "$metadata": {"$model": "reader"},
                "accessLevel": "visitor", "failMode": "failopen"}"#,
            &[
                rel("fromSpace", "d", "a"),
                rel("toSpace", "d", "b"),
                rel("servedBy", "d", "c1"),
                rel("servedBy", "d", "c2"),
                rel("servedBy", "d", "r1"),
                rel("servedBy", "d", "r2"),
            ]
            .join(","),
        );
        let network = extract(&g, &config()).unwrap();

        let entry = EdgeDescription::new("a", "b")
            .with_privacy_cost(5.0)
            .with_priv_avail(50.0)
            .with_level(0.5)
            .with_level_avail(80.0)
            .with_fail_mode(FailMode::FailOpen);
        let exit = EdgeDescription::new("b", "a")
            .with_privacy_cost(5.0)
            .with_priv_avail(50.0)
            .with_fail_mode(FailMode::FailOpen);
        assert_eq!(network.edges, vec![entry, exit]);
    }

    #[test]
    fn test_unknown_access_level_locks_door() {
        let g = graph(
            r#"{"$dtId": "a", "$metadata": {"$model": "space"}},
               {"$dtId": "b", "$metadata": {"$model": "space"}},
               {"$dtId": "d", "$metadata": {"$model": "door"}, "direction": "oneway"},
               {"$dtId": "r", "$metadata": {"$model": "reader"}, "accessLevel": "janitor"}"#,
            &[
                rel("fromSpace", "d", "a"),
                rel("toSpace", "d", "b"),
                rel("servedBy", "d", "r"),
            ]
            .join(","),
        );
        let network = extract(&g, &config()).unwrap();
        assert_eq!(network.edges[0].level, 0.0);

        let custom = extract(&g, &config().with_access_level("janitor", 0.9)).unwrap();
        assert_eq!(custom.edges[0].level, 0.9);
    }

    #[test]
    fn test_parallel_doors_are_rejected() {
        let g = graph(
            r#"{"$dtId": "a", "$metadata": {"$model": "space"}},
               {"$dtId": "b", "$metadata": {"$model": "space"}},
               {"$dtId": "d1", "$metadata": {"$model": "door"}, "direction": "oneway"},
               {"$dtId": "d2", "$metadata": {"$model": "door"}, "direction": "oneway"},
               {"$dtId": "c", "$metadata": {"$model": "camera"}, "privacyCost": 9}"#,
            &[
                rel("fromSpace", "d1", "a"),
                rel("toSpace", "d1", "b"),
                rel("servedBy", "d1", "c"),
                rel("fromSpace", "d2", "a"),
                rel("toSpace", "d2", "b"),
            ]
            .join(","),
        );
        match extract(&g, &config()) {
            Err(TwinError::DuplicatePassage { from, to, first_door, second_door }) => {
                assert_eq!((from.as_str(), to.as_str()), ("a", "b"));
                assert_eq!((first_door.as_str(), second_door.as_str()), ("d1", "d2"));
            }
            other => panic!("expected a duplicate passage, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_clashing_with_entry_is_rejected() {
        let g = graph(
            r#"{"$dtId": "a", "$metadata": {"$model": "space"}},
               {"$dtId": "b", "$metadata": {"$model": "space"}},
               {"$dtId": "d1", "$metadata": {"$model": "door"}},
               {"$dtId": "d2", "$metadata": {"$model": "door"}, "direction": "oneway"}"#,
            &[
                rel("fromSpace", "d1", "a"),
                rel("toSpace", "d1", "b"),
                rel("fromSpace", "d2", "b"),
                rel("toSpace", "d2", "a"),
            ]
            .join(","),
        );
        assert!(matches!(
            extract(&g, &config()),
            Err(TwinError::DuplicatePassage { second_door, .. }) if second_door == "d2"
        ));
    }

    #[test]
    fn test_wrongly_typed_property_is_reported() {
        let g = graph(
            r#"{"$dtId": "a", "$metadata": {"$model": "space"}},
               {"$dtId": "d", "$metadata": {"$model": "door"}},
               {"$dtId": "c", "$metadata": {"$model": "camera"}, "privacyCost": "high"}"#,
            &rel("servedBy", "d", "c"),
        );
        assert!(matches!(
            extract(&g, &config()),
            Err(TwinError::InvalidProperty { property, .. }) if property == "privacyCost"
        ));
    }

    #[test]
    fn test_default_models() {
        let config = ExtractorConfig::default();
        assert_eq!(config.space_model, "dtmi:digitaltwins:rec_3_3:core:Space;1");
        assert_eq!(config.level_of("security"), 0.25);
        assert_eq!(config.level_of("nobody"), 0.0);
    }
}
