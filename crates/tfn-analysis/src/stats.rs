//! Whole-graph summary statistics.
//!
//! Structural counts come from petgraph (Tarjan SCC, undirected walks);
//! the distance-based measures (diameter, periphery) run on the
//! undirected view and are only defined when that view is connected.
//! Measures that cannot be produced for a given graph come back as a
//! typed [`NotComputable`] reason instead of an error, so one degenerate
//! metric never aborts a run.

use std::collections::VecDeque;
use std::fmt;

use petgraph::algo::tarjan_scc;
use tfn_data::TransferRecord;

use crate::builder::TransferGraph;

/// Reason a measure could not be produced for this graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotComputable {
    /// The undirected view is not connected.
    DisconnectedGraph,
    /// Degree variance is zero, so the correlation is undefined.
    DegenerateDegrees,
    /// The graph is too small for the measure to mean anything.
    TooFewNodes,
}

impl NotComputable {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DisconnectedGraph => "graph is disconnected",
            Self::DegenerateDegrees => "all degrees are identical",
            Self::TooFewNodes => "graph is too small",
        }
    }
}

impl fmt::Display for NotComputable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not computable ({})", self.reason())
    }
}

/// A measure that either computed or knows why it did not.
pub type MetricOutcome<T> = Result<T, NotComputable>;

/// Fee aggregates over the filtered record set.
///
/// Computed on the records, not the graph, so a connected-only
/// restriction does not change the money totals shown to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeStats {
    /// Number of filtered transfers.
    pub transfers: usize,
    /// Sum of fees, in millions.
    pub total_millions: f64,
    /// Mean fee, in millions; zero when there are no transfers.
    pub mean_millions: f64,
}

/// One build's worth of whole-graph statistics.
#[derive(Debug, Clone)]
pub struct GraphSummary {
    pub clubs: usize,
    pub flows: usize,
    /// `m / (n (n - 1))` for a simple directed graph.
    pub density: f64,
    pub strongly_connected: usize,
    pub weakly_connected: usize,
    pub diameter: MetricOutcome<usize>,
    /// Clubs at maximum eccentricity in the undirected view.
    pub periphery: MetricOutcome<Vec<String>>,
    /// Pearson correlation of (source out-degree, target in-degree) over edges.
    pub assortativity: MetricOutcome<f64>,
    pub fees: FeeStats,
}

/// Fee aggregates for a filtered record set.
pub fn fee_stats<'a, I>(records: I) -> FeeStats
where
    I: IntoIterator<Item = &'a TransferRecord>,
{
    let mut transfers = 0usize;
    let mut total = 0.0_f64;
    for record in records {
        transfers += 1;
        total += record.fee;
    }

    let total_millions = total / 1e6;
    FeeStats {
        transfers,
        total_millions,
        mean_millions: if transfers > 0 {
            total_millions / transfers as f64
        } else {
            0.0
        },
    }
}

/// Compute the full summary for a built graph.
pub fn summarize(graph: &TransferGraph, fees: FeeStats) -> GraphSummary {
    let (diameter, periphery) = diameter_and_periphery(graph);

    GraphSummary {
        clubs: graph.node_count(),
        flows: graph.edge_count(),
        density: density(graph),
        strongly_connected: tarjan_scc(&graph.graph).len(),
        weakly_connected: graph.weak_components().len(),
        diameter,
        periphery,
        assortativity: assortativity(graph),
        fees,
    }
}

/// Edge count over possible ordered pairs; zero for fewer than two nodes.
pub fn density(graph: &TransferGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// Diameter and periphery of the undirected view.
///
/// Runs a BFS from every node; any unreachable pair makes both measures
/// undefined.
pub fn diameter_and_periphery(
    graph: &TransferGraph,
) -> (MetricOutcome<usize>, MetricOutcome<Vec<String>>) {
    let n = graph.node_count();
    if n == 0 {
        return (
            Err(NotComputable::TooFewNodes),
            Err(NotComputable::TooFewNodes),
        );
    }

    let mut eccentricities = Vec::with_capacity(n);
    for start in graph.graph.node_indices() {
        let mut distance = vec![usize::MAX; n];
        distance[start.index()] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut seen = 1usize;
        let mut eccentricity = 0usize;

        while let Some(node) = queue.pop_front() {
            for next in graph.graph.neighbors_undirected(node) {
                let w = next.index();
                if distance[w] == usize::MAX {
                    distance[w] = distance[node.index()] + 1;
                    eccentricity = eccentricity.max(distance[w]);
                    seen += 1;
                    queue.push_back(next);
                }
            }
        }

        if seen < n {
            return (
                Err(NotComputable::DisconnectedGraph),
                Err(NotComputable::DisconnectedGraph),
            );
        }
        eccentricities.push(eccentricity);
    }

    let diameter = eccentricities.iter().copied().max().unwrap_or(0);
    let periphery = graph
        .graph
        .node_indices()
        .filter(|node| eccentricities[node.index()] == diameter)
        .map(|node| graph.club(node).to_string())
        .collect();

    (Ok(diameter), Ok(periphery))
}

/// Degree assortativity: Pearson correlation over edges of the source's
/// out-degree against the target's in-degree.
pub fn assortativity(graph: &TransferGraph) -> MetricOutcome<f64> {
    use petgraph::visit::EdgeRef;

    let m = graph.edge_count();
    if m == 0 {
        return Err(NotComputable::TooFewNodes);
    }

    let pairs: Vec<(f64, f64)> = graph
        .graph
        .edge_references()
        .map(|edge| {
            (
                graph.out_degree(edge.source()) as f64,
                graph.in_degree(edge.target()) as f64,
            )
        })
        .collect();

    let m = m as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / m;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / m;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        covariance += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Err(NotComputable::DegenerateDegrees);
    }

    Ok(covariance / (var_x.sqrt() * var_y.sqrt()))
}

/// Total-degree histogram with unit-width bins from the minimum to the
/// maximum observed degree, empty bins included.
pub fn degree_distribution(graph: &TransferGraph) -> Vec<(usize, usize)> {
    let degrees: Vec<usize> = graph
        .graph
        .node_indices()
        .map(|node| graph.degree(node))
        .collect();

    let Some(&min) = degrees.iter().min() else {
        return Vec::new();
    };
    let max = *degrees.iter().max().unwrap_or(&min);

    let mut bins: Vec<(usize, usize)> = (min..=max).map(|degree| (degree, 0)).collect();
    for degree in degrees {
        bins[degree - min].1 += 1;
    }
    bins
}

/// Adjacency matrix restricted to the highest-degree clubs.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    /// Row/column labels, by descending degree (name breaks ties).
    pub labels: Vec<String>,
    /// `cells[row][col]` = transfers on the edge labels\[row\] → labels\[col\].
    pub cells: Vec<Vec<u32>>,
}

/// Build the truncated adjacency matrix for the top `limit` clubs by
/// total degree. Cell values are aggregated transfer counts.
pub fn adjacency_top_degree(graph: &TransferGraph, limit: usize) -> AdjacencyMatrix {
    let mut nodes: Vec<_> = graph.graph.node_indices().collect();
    nodes.sort_by(|&a, &b| {
        graph
            .degree(b)
            .cmp(&graph.degree(a))
            .then_with(|| graph.club(a).cmp(graph.club(b)))
    });
    nodes.truncate(limit);

    let labels = nodes
        .iter()
        .map(|&node| graph.club(node).to_string())
        .collect();
    let cells = nodes
        .iter()
        .map(|&row| {
            nodes
                .iter()
                .map(|&col| {
                    graph
                        .graph
                        .find_edge(row, col)
                        .map(|edge| graph.graph[edge].transfers)
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    AdjacencyMatrix { labels, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfn_data::Direction as Dir;

    fn record(team: &str, counter: &str, dir: Dir, fee: f64) -> TransferRecord {
        TransferRecord {
            team: team.to_string(),
            counter_team: counter.to_string(),
            dir,
            fee,
        }
    }

    fn graph_of(records: &[TransferRecord]) -> TransferGraph {
        TransferGraph::from_records(records)
    }

    #[test]
    fn density_of_a_two_node_single_edge_graph() {
        let graph = graph_of(&[record("A", "B", Dir::Out, 1e6)]);
        assert!((density(&graph) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn density_degenerate_graphs_are_zero() {
        assert_eq!(density(&graph_of(&[])), 0.0);
    }

    #[test]
    fn component_counts_on_a_cycle() {
        let graph = graph_of(&[
            record("A", "B", Dir::Out, 1e6),
            record("B", "C", Dir::Out, 1e6),
            record("C", "A", Dir::Out, 1e6),
        ]);
        let summary = summarize(&graph, fee_stats(&[]));

        assert_eq!(summary.strongly_connected, 1);
        assert_eq!(summary.weakly_connected, 1);
        assert_eq!(summary.diameter, Ok(1));
    }

    #[test]
    fn path_has_more_sccs_than_wccs() {
        let graph = graph_of(&[
            record("A", "B", Dir::Out, 1e6),
            record("B", "C", Dir::Out, 1e6),
        ]);
        let summary = summarize(&graph, fee_stats(&[]));

        assert_eq!(summary.strongly_connected, 3);
        assert_eq!(summary.weakly_connected, 1);
    }

    #[test]
    fn diameter_and_periphery_of_a_path() {
        let graph = graph_of(&[
            record("A", "B", Dir::Out, 1e6),
            record("B", "C", Dir::Out, 1e6),
        ]);
        let (diameter, periphery) = diameter_and_periphery(&graph);

        assert_eq!(diameter, Ok(2));
        let mut ends = periphery.expect("connected path should have a periphery");
        ends.sort();
        assert_eq!(ends, vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn disconnected_graph_has_no_diameter() {
        let graph = graph_of(&[
            record("A", "B", Dir::Out, 1e6),
            record("X", "Y", Dir::Out, 1e6),
        ]);
        let (diameter, periphery) = diameter_and_periphery(&graph);

        assert_eq!(diameter, Err(NotComputable::DisconnectedGraph));
        assert_eq!(periphery, Err(NotComputable::DisconnectedGraph));
    }

    #[test]
    fn assortativity_degenerate_on_uniform_degrees() {
        // Cycle: every out-degree and in-degree is 1.
        let graph = graph_of(&[
            record("A", "B", Dir::Out, 1e6),
            record("B", "C", Dir::Out, 1e6),
            record("C", "A", Dir::Out, 1e6),
        ]);
        assert_eq!(assortativity(&graph), Err(NotComputable::DegenerateDegrees));
    }

    #[test]
    fn assortativity_needs_edges() {
        assert_eq!(
            assortativity(&graph_of(&[])),
            Err(NotComputable::TooFewNodes)
        );
    }

    #[test]
    fn assortativity_mixed_degrees_is_finite() {
        // Hub A sells to B, C, D; D sells to B.
        let graph = graph_of(&[
            record("A", "B", Dir::Out, 1e6),
            record("A", "C", Dir::Out, 1e6),
            record("A", "D", Dir::Out, 1e6),
            record("D", "B", Dir::Out, 1e6),
        ]);
        let value = assortativity(&graph).expect("should compute");
        assert!((-1.0..=1.0).contains(&value));
    }

    #[test]
    fn degree_distribution_covers_empty_bins() {
        // Star: center degree 3, leaves degree 1 -> bin for degree 2 is empty.
        let graph = graph_of(&[
            record("Hub", "A", Dir::Out, 1e6),
            record("Hub", "B", Dir::Out, 1e6),
            record("Hub", "C", Dir::In, 1e6),
        ]);
        let bins = degree_distribution(&graph);

        assert_eq!(bins, vec![(1, 3), (2, 0), (3, 1)]);
    }

    #[test]
    fn fee_stats_in_millions() {
        let records = vec![
            record("A", "B", Dir::Out, 5e6),
            record("C", "D", Dir::Out, 3e6),
        ];
        let fees = fee_stats(&records);

        assert_eq!(fees.transfers, 2);
        assert!((fees.total_millions - 8.0).abs() < 1e-12);
        assert!((fees.mean_millions - 4.0).abs() < 1e-12);
    }

    #[test]
    fn fee_stats_empty_is_zero() {
        let fees = fee_stats(&[]);
        assert_eq!(fees.transfers, 0);
        assert_eq!(fees.mean_millions, 0.0);
    }

    #[test]
    fn adjacency_orders_by_degree_and_truncates() {
        let graph = graph_of(&[
            record("Hub", "A", Dir::Out, 1e6),
            record("Hub", "B", Dir::Out, 1e6),
            record("Hub", "B", Dir::Out, 2e6),
            record("Hub", "C", Dir::In, 1e6),
        ]);

        let matrix = adjacency_top_degree(&graph, 2);
        // Hub has degree 3, the rest degree 1; A wins the tie by name.
        assert_eq!(matrix.labels, vec!["Hub".to_string(), "A".to_string()]);

        let full = adjacency_top_degree(&graph, 10);
        assert_eq!(full.labels.len(), 4);
        let hub = full.labels.iter().position(|l| l == "Hub").unwrap();
        let b = full.labels.iter().position(|l| l == "B").unwrap();
        let c = full.labels.iter().position(|l| l == "C").unwrap();
        assert_eq!(full.cells[hub][b], 2);
        assert_eq!(full.cells[b][hub], 0);
        assert_eq!(full.cells[c][hub], 1);
    }

    #[test]
    fn not_computable_displays_reason() {
        assert_eq!(
            NotComputable::DisconnectedGraph.to_string(),
            "not computable (graph is disconnected)"
        );
    }
}
