//! Testing utilities for the percolation workspace
//!
//! Shared network fixtures and proptest strategies.

#![allow(missing_docs)]

use perc_network::{EdgeDescription, FailMode, Network, NetworkDescription};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Edge that is always passable for every `rho < 1` and always charges `cost`
pub fn guarded_edge(from: &str, to: &str, cost: f64) -> EdgeDescription {
    EdgeDescription::new(from, to)
        .with_privacy_cost(cost)
        .with_level(1.0)
        .with_level_avail(100.0)
        .with_priv_avail(100.0)
        .with_fail_mode(FailMode::FailClosed)
}

pub fn description(nodes: &[&str], edges: Vec<EdgeDescription>) -> NetworkDescription {
    NetworkDescription {
        nodes: nodes.iter().map(|n| (*n).to_string()).collect(),
        edges,
    }
}

pub fn network(nodes: &[&str], edges: Vec<EdgeDescription>) -> Network {
    Network::from_description(&description(nodes, edges)).unwrap()
}

/// `A -> B` with `priv = 1`, `level = 0`, always-available reader and sensor,
/// fail-closed
pub fn single_door() -> Network {
    network(
        &["A", "B"],
        vec![EdgeDescription::new("A", "B")
            .with_privacy_cost(1.0)
            .with_priv_avail(100.0)
            .with_level(0.0)
            .with_level_avail(100.0)
            .with_fail_mode(FailMode::FailClosed)],
    )
}

/// `n0 -> n1 -> ... -> n{len-1}`, every hop a [`guarded_edge`] of `cost`
pub fn chain(len: usize, cost: f64) -> Network {
    let ids: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
    let edges = ids
        .windows(2)
        .map(|pair| guarded_edge(&pair[0], &pair[1], cost))
        .collect();
    Network::from_description(&NetworkDescription {
        nodes: ids,
        edges,
    })
    .unwrap()
}

/// `width x height` grid with two-way [`guarded_edge`]s of `cost`
pub fn grid(width: usize, height: usize, cost: f64) -> Network {
    let id = |x: usize, y: usize| format!("r{x}_{y}");
    let mut nodes = Vec::with_capacity(width * height);
    let mut edges = Vec::new();
    for y in 0..height {
        for x in 0..width {
            nodes.push(id(x, y));
            if x + 1 < width {
                edges.push(guarded_edge(&id(x, y), &id(x + 1, y), cost));
                edges.push(guarded_edge(&id(x + 1, y), &id(x, y), cost));
            }
            if y + 1 < height {
                edges.push(guarded_edge(&id(x, y), &id(x, y + 1), cost));
                edges.push(guarded_edge(&id(x, y + 1), &id(x, y), cost));
            }
        }
    }
    Network::from_description(&NetworkDescription { nodes, edges }).unwrap()
}

pub fn arb_fail_mode() -> impl Strategy<Value = FailMode> {
    prop_oneof![
        Just(FailMode::FailOpen),
        Just(FailMode::FailClosed),
        Just(FailMode::Unrecognized("failsecure".to_string())),
    ]
}

/// Random valid network description with up to `max_nodes` nodes
///
/// Availabilities are drawn from a few percentages that include the 0 and 100
/// extremes; costs are small integers so budget boundaries get exercised.
pub fn arb_description(max_nodes: usize) -> impl Strategy<Value = NetworkDescription> {
    (1..=max_nodes).prop_flat_map(|count| {
        let edge = (
            0..count,
            0..count,
            0u8..4,
            prop_oneof![Just(0.0), Just(50.0), Just(100.0)],
            prop_oneof![Just(0.0), Just(0.3), Just(0.6), Just(1.0)],
            prop_oneof![Just(0.0), Just(50.0), Just(100.0)],
            arb_fail_mode(),
        );
        proptest::collection::vec(edge, 0..count * 3).prop_map(move |raw| {
            let nodes: Vec<String> = (0..count).map(|i| format!("n{i}")).collect();
            let mut seen = BTreeSet::new();
            let edges = raw
                .into_iter()
                .filter(|(from, to, ..)| seen.insert((*from, *to)))
                .map(|(from, to, cost, priv_avail, level, level_avail, mode)| {
                    EdgeDescription::new(nodes[from].clone(), nodes[to].clone())
                        .with_privacy_cost(f64::from(cost))
                        .with_priv_avail(priv_avail)
                        .with_level(level)
                        .with_level_avail(level_avail)
                        .with_fail_mode(mode)
                })
                .collect();
            NetworkDescription { nodes, edges }
        })
    })
}
