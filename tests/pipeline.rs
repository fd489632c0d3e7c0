//! End-to-end tests over the filter → build → measure pipeline.

mod common;

use common::{acceptance_scenario, acceptance_scenario_csv, record};
use tfn_analysis::builder::{build, BuildOptions, TransferGraph};
use tfn_analysis::metrics;
use tfn_analysis::stats;
use tfn_data::{loader, Direction};

/// The acceptance scenario, run through the real CSV intake path.
///
/// Three records, min fee 1M:
/// - edge A→B with count 2, total 8M, avg 4M
/// - edge A→C with count 1, total 10M (C acting, A counter, inbound:
///   the counter-party is the source)
/// - node set {A, B, C}
#[test]
fn acceptance_scenario_from_csv() {
    let records = loader::parse_str(&acceptance_scenario_csv()).expect("csv should parse");
    assert_eq!(records, acceptance_scenario());

    let graph = build(
        &records,
        &BuildOptions {
            min_fee_millions: 1.0,
            connected_only: false,
        },
    );

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    for club in ["A", "B", "C"] {
        assert!(graph.club_to_ix.contains_key(club), "missing node {club}");
    }

    let ab = graph.flow_between("A", "B").expect("A->B should exist");
    assert_eq!(ab.transfers, 2);
    assert_eq!(ab.total_fee, 8e6);
    assert_eq!(ab.avg_fee, 4e6);

    let ac = graph.flow_between("A", "C").expect("A->C should exist");
    assert_eq!(ac.transfers, 1);
    assert_eq!(ac.total_fee, 10e6);
    assert_eq!(ac.avg_fee, 10e6);
}

/// Every edge endpoint is in the node set; petgraph guarantees this
/// structurally, so check through the name lookup as the dashboard uses it.
#[test]
fn no_dangling_edge_endpoints() {
    use petgraph::visit::EdgeRef;

    let records = vec![
        record("A", "B", Direction::Out, 2e6),
        record("C", "D", Direction::In, 3e6),
        record("E", "A", Direction::Out, 4e6),
    ];
    let graph = TransferGraph::from_records(&records);

    for edge in graph.graph.edge_references() {
        let source = graph.club(edge.source());
        let target = graph.club(edge.target());
        assert_eq!(graph.club_to_ix[source], edge.source());
        assert_eq!(graph.club_to_ix[target], edge.target());
    }
}

/// No edge may derive from a record below `min_fee * 1e6`.
#[test]
fn filter_threshold_is_in_base_units() {
    let records = vec![
        record("A", "B", Direction::Out, 999_999.0),
        record("A", "B", Direction::Out, 1_000_000.0),
        record("C", "D", Direction::Out, 500_000.0),
    ];

    let graph = build(
        &records,
        &BuildOptions {
            min_fee_millions: 1.0,
            connected_only: false,
        },
    );

    assert_eq!(graph.node_count(), 2);
    let ab = graph.flow_between("A", "B").expect("A->B should exist");
    assert_eq!(ab.transfers, 1);
    assert_eq!(ab.total_fee, 1e6);
    assert!(graph.flow_between("C", "D").is_none());
}

/// Connected-only mode leaves exactly one weakly-connected component.
#[test]
fn connected_only_leaves_one_component() {
    let records = vec![
        record("A", "B", Direction::Out, 2e6),
        record("B", "C", Direction::Out, 2e6),
        record("X", "Y", Direction::Out, 2e6),
    ];

    let graph = build(&records, &BuildOptions::default());
    assert_eq!(graph.weak_components().len(), 1);
    assert_eq!(graph.node_count(), 3);

    let summary = stats::summarize(&graph, stats::fee_stats(&[]));
    assert_eq!(summary.weakly_connected, 1);
}

/// Empty filtered input builds an empty graph rather than panicking;
/// the rendering layer turns that into a user-visible error.
#[test]
fn empty_input_builds_empty_graph() {
    let graph = build(&[], &BuildOptions::default());
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

/// Centrality attaches a value for every node after a build.
#[test]
fn metrics_cover_every_node() {
    let records = loader::parse_str(&acceptance_scenario_csv()).expect("csv should parse");
    let graph = build(&records, &BuildOptions::default());
    let all = metrics::compute(&graph);

    assert_eq!(all.len(), graph.node_count());
    let a = graph.club_to_ix["A"];
    assert_eq!(all[a.index()].out_degree, 2);
    assert_eq!(all[a.index()].in_degree, 0);
}
