use perc_network::{Network, NetworkDescription, NetworkError};
use perc_test_utils::{arb_description, description, guarded_edge, single_door};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn adjacency(network: &Network) -> Vec<(String, BTreeSet<String>)> {
    let mut rows: Vec<_> = network
        .nodes()
        .map(|node| {
            (
                node.to_string(),
                network
                    .neighbours(node)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            )
        })
        .collect();
    rows.sort();
    rows
}

proptest! {
    #[test]
    fn prop_build_is_idempotent(desc in arb_description(8)) {
        let first = Network::from_description(&desc).unwrap();
        let second = Network::from_description(&desc).unwrap();

        prop_assert_eq!(adjacency(&first), adjacency(&second));
        prop_assert_eq!(first.fingerprint(), second.fingerprint());
        for edge in &desc.edges {
            prop_assert_eq!(
                first.edge(&edge.from, &edge.to).unwrap(),
                second.edge(&edge.from, &edge.to).unwrap()
            );
        }
    }

    #[test]
    fn prop_build_ignores_declaration_order(desc in arb_description(8)) {
        let mut reversed = desc.clone();
        reversed.nodes.reverse();
        reversed.edges.reverse();

        let forward = Network::from_description(&desc).unwrap();
        let backward = Network::from_description(&reversed).unwrap();

        prop_assert_eq!(adjacency(&forward), adjacency(&backward));
        prop_assert_eq!(forward.fingerprint(), backward.fingerprint());
        for edge in &desc.edges {
            prop_assert_eq!(
                forward.edge(&edge.from, &edge.to).unwrap(),
                backward.edge(&edge.from, &edge.to).unwrap()
            );
        }
    }

    #[test]
    fn prop_description_round_trips_through_index(desc in arb_description(8)) {
        let network = Network::from_description(&desc).unwrap();
        prop_assert_eq!(network.to_description(), desc);
    }
}

#[test]
fn test_duplicate_edge_yields_no_network() {
    let desc = description(
        &["A", "B"],
        vec![guarded_edge("A", "B", 1.0), guarded_edge("A", "B", 2.0)],
    );

    let result = Network::from_description(&desc);

    assert!(matches!(
        result,
        Err(NetworkError::DuplicateEdge { ref from, ref to }) if from == "A" && to == "B"
    ));
}

#[test]
fn test_undeclared_node_yields_no_network() {
    let desc = description(&["A"], vec![guarded_edge("A", "B", 1.0)]);
    let err = Network::from_description(&desc).unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(err.to_string(), "edge A -> B references undeclared node B");
}

#[test]
fn test_json_duplicate_edge_is_rejected() {
    let text = r#"{
        "nodes": ["A", "B"],
        "edges": [
            {"from": "A", "to": "B", "priv": 1, "privAvail": 100,
             "level": 0, "levelAvail": 100, "failMode": "failclosed"},
            {"from": "A", "to": "B", "priv": 3, "privAvail": 50,
             "level": 1, "levelAvail": 90, "failMode": "failopen"}
        ]
    }"#;
    assert!(matches!(
        Network::from_json(text),
        Err(NetworkError::DuplicateEdge { .. })
    ));
}

#[test]
fn test_single_door_fixture() {
    let network = single_door();
    let edge = network.edge("A", "B").unwrap();

    assert_eq!(edge.privacy_cost, 1.0);
    assert_eq!(edge.level, 0.0);
    assert!(edge.fail_mode.is_fail_closed());
    assert!(network.edge("B", "A").is_err());
}

#[test]
fn test_fingerprint_tracks_attributes() {
    let base = Network::from_description(&description(
        &["A", "B"],
        vec![guarded_edge("A", "B", 1.0)],
    ))
    .unwrap();
    let changed = Network::from_description(&description(
        &["A", "B"],
        vec![guarded_edge("A", "B", 1.0).with_level(0.5)],
    ))
    .unwrap();

    assert_ne!(base.fingerprint(), changed.fingerprint());
    assert_eq!(base.fingerprint().len(), 64);
}

#[test]
fn test_empty_network() {
    let network = Network::from_description(&NetworkDescription::default()).unwrap();
    assert_eq!(network.node_count(), 0);
    assert_eq!(network.edge_count(), 0);
    assert!(network.edge("A", "B").is_err());
}
