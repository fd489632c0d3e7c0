//! View-model assembly for the dashboard payload.
//!
//! This is the glue between the analysis crate and anything that renders:
//! it runs the whole pipeline (filter → build → metrics → summarize) and
//! shapes the result into serializable structures the page, the JSON API,
//! and the terminal tables all share.

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

use tfn_analysis::builder::{self, TransferGraph};
use tfn_analysis::metrics::{self, NodeMetrics, SizeMetric};
use tfn_analysis::normalize::{self, SizeRange};
use tfn_analysis::stats::{self, MetricOutcome};
use tfn_data::TransferRecord;

/// Node fill color (blue, clubs).
pub const NODE_COLOR: &str = "#1f78b4";
/// Edge stroke color (light grey).
pub const EDGE_COLOR: &str = "#b3b3b3";
/// Rows shown in each top-clubs table.
pub const RANKING_LIMIT: usize = 10;
/// Clubs kept in the truncated adjacency matrix.
pub const ADJACENCY_LIMIT: usize = 20;

/// User-facing parameters, re-applied on every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    /// Metric that scales node sizes.
    pub size_metric: SizeMetric,
    /// Widen edges by aggregated transfer value.
    pub edge_width_by_value: bool,
    /// Run the layout physics simulation.
    pub physics: bool,
    /// Restrict to the largest weakly-connected component.
    pub connected_only: bool,
    /// Minimum transfer fee, in millions.
    pub min_fee_millions: f64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            size_metric: SizeMetric::Degree,
            edge_width_by_value: true,
            physics: true,
            connected_only: true,
            min_fee_millions: 1.0,
        }
    }
}

/// One drawable node.
#[derive(Debug, Clone, Serialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    pub size: f64,
    pub color: &'static str,
    /// Hover tooltip with every per-club measure.
    pub title: String,
}

/// One drawable edge.
#[derive(Debug, Clone, Serialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    pub width: f64,
    pub title: String,
    pub color: &'static str,
}

/// A metric slot that either holds a formatted value or the reason it
/// could not be computed.
#[derive(Debug, Clone, Serialize)]
pub struct MetricCell {
    pub value: Option<String>,
    pub reason: Option<&'static str>,
}

impl MetricCell {
    fn from_outcome<T>(outcome: &MetricOutcome<T>, format: impl FnOnce(&T) -> String) -> Self {
        match outcome {
            Ok(value) => Self {
                value: Some(format(value)),
                reason: None,
            },
            Err(not_computable) => Self {
                value: None,
                reason: Some(not_computable.reason()),
            },
        }
    }
}

/// Whole-graph numbers for the metric cards.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub clubs: usize,
    pub flows: usize,
    pub density: f64,
    pub strongly_connected: usize,
    pub weakly_connected: usize,
    pub diameter: MetricCell,
    pub periphery: MetricCell,
    pub assortativity: MetricCell,
    pub transfers: usize,
    pub total_fee_millions: f64,
    pub avg_fee_millions: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistogramBin {
    pub degree: usize,
    pub count: usize,
}

/// One row of the centrality tables.
#[derive(Debug, Clone, Serialize)]
pub struct CentralityRow {
    pub club: String,
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: f64,
}

/// Top clubs for one measure.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTable {
    pub metric: SizeMetric,
    pub label: &'static str,
    pub rows: Vec<CentralityRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjacencyView {
    pub labels: Vec<String>,
    pub cells: Vec<Vec<u32>>,
}

/// Everything the page needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub generated_at: String,
    pub params: RenderParams,
    /// Renderer options (fonts, hover, physics) as raw JSON.
    pub options: serde_json::Value,
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
    pub summary: SummaryView,
    pub degree_histogram: Vec<HistogramBin>,
    pub rankings: Vec<RankedTable>,
    pub adjacency: AdjacencyView,
}

/// Run the full pipeline over already-loaded records.
///
/// # Errors
/// Returns error if the fee threshold is negative or no transfers survive
/// the filter (there is nothing to draw or measure).
pub fn run_pipeline(records: &[TransferRecord], params: &RenderParams) -> Result<DashboardData> {
    if params.min_fee_millions < 0.0 {
        return Err(eyre!("minimum transfer fee must be non-negative"));
    }

    let kept = builder::filter_records(records, params.min_fee_millions);
    let mut graph = TransferGraph::from_records(kept.iter().copied());
    if params.connected_only {
        graph = graph.largest_weak_component();
    }

    if graph.node_count() == 0 {
        return Err(eyre!(
            "no transfers at or above the minimum fee of {}M",
            params.min_fee_millions
        ));
    }

    let node_metrics = metrics::compute(&graph);
    let fees = stats::fee_stats(kept.iter().copied());
    let summary = stats::summarize(&graph, fees);

    Ok(assemble(&graph, &node_metrics, &summary, params))
}

/// Shape computed results into the payload. Assumes a non-empty graph.
fn assemble(
    graph: &TransferGraph,
    node_metrics: &[NodeMetrics],
    summary: &stats::GraphSummary,
    params: &RenderParams,
) -> DashboardData {
    DashboardData {
        generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        params: *params,
        options: vis_options(params.physics),
        nodes: build_nodes(graph, node_metrics, params),
        edges: build_edges(graph, params),
        summary: summary_view(summary),
        degree_histogram: stats::degree_distribution(graph)
            .into_iter()
            .map(|(degree, count)| HistogramBin { degree, count })
            .collect(),
        rankings: build_rankings(graph, node_metrics),
        adjacency: adjacency_view(graph),
    }
}

fn build_nodes(
    graph: &TransferGraph,
    node_metrics: &[NodeMetrics],
    params: &RenderParams,
) -> Vec<VisNode> {
    let range = SizeRange::for_physics(params.physics);
    let values: Vec<f64> = node_metrics
        .iter()
        .map(|m| m.value(params.size_metric))
        .collect();
    let min_value = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    graph
        .graph
        .node_indices()
        .map(|node| {
            let club = graph.club(node);
            let m = &node_metrics[node.index()];
            VisNode {
                id: club.to_string(),
                label: club.to_string(),
                size: normalize::node_size(values[node.index()], min_value, max_value, range),
                color: NODE_COLOR,
                title: format!(
                    "Club: {club}\n\
                     Total degree: {}\n\
                     In-degree: {}\n\
                     Out-degree: {}\n\
                     Betweenness: {:.3}\n\
                     Closeness: {:.3}\n\
                     Eigenvector: {:.3}",
                    m.degree, m.in_degree, m.out_degree, m.betweenness, m.closeness, m.eigenvector
                ),
            }
        })
        .collect()
}

fn build_edges(graph: &TransferGraph, params: &RenderParams) -> Vec<VisEdge> {
    use petgraph::visit::EdgeRef;

    graph
        .graph
        .edge_references()
        .map(|edge| {
            let flow = edge.weight();
            let millions = flow.total_fee / 1e6;

            let (width, title) = if params.edge_width_by_value {
                (
                    normalize::edge_width(flow.total_fee),
                    format!(
                        "Total value: €{millions:.2}M\nTransfers: {}",
                        flow.transfers
                    ),
                )
            } else {
                (
                    1.0,
                    format!(
                        "Transfers: {}\nTotal value: €{millions:.2}M",
                        flow.transfers
                    ),
                )
            };

            VisEdge {
                from: graph.club(edge.source()).to_string(),
                to: graph.club(edge.target()).to_string(),
                width,
                title,
                color: EDGE_COLOR,
            }
        })
        .collect()
}

fn summary_view(summary: &stats::GraphSummary) -> SummaryView {
    SummaryView {
        clubs: summary.clubs,
        flows: summary.flows,
        density: summary.density,
        strongly_connected: summary.strongly_connected,
        weakly_connected: summary.weakly_connected,
        diameter: MetricCell::from_outcome(&summary.diameter, |d| d.to_string()),
        periphery: MetricCell::from_outcome(&summary.periphery, |clubs| clubs.join(", ")),
        assortativity: MetricCell::from_outcome(&summary.assortativity, |a| format!("{a:.4}")),
        transfers: summary.fees.transfers,
        total_fee_millions: summary.fees.total_millions,
        avg_fee_millions: summary.fees.mean_millions,
    }
}

fn build_rankings(graph: &TransferGraph, node_metrics: &[NodeMetrics]) -> Vec<RankedTable> {
    let rows: Vec<CentralityRow> = graph
        .graph
        .node_indices()
        .map(|node| {
            let m = &node_metrics[node.index()];
            CentralityRow {
                club: graph.club(node).to_string(),
                degree: m.degree,
                in_degree: m.in_degree,
                out_degree: m.out_degree,
                betweenness: m.betweenness,
                closeness: m.closeness,
                eigenvector: m.eigenvector,
            }
        })
        .collect();

    SizeMetric::ALL
        .iter()
        .map(|&metric| {
            let mut ranked = rows.clone();
            ranked.sort_by(|a, b| {
                let av = row_value(a, metric);
                let bv = row_value(b, metric);
                bv.partial_cmp(&av)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.club.cmp(&b.club))
            });
            ranked.truncate(RANKING_LIMIT);

            RankedTable {
                metric,
                label: metric.label(),
                rows: ranked,
            }
        })
        .collect()
}

fn row_value(row: &CentralityRow, metric: SizeMetric) -> f64 {
    match metric {
        SizeMetric::Degree => row.degree as f64,
        SizeMetric::InDegree => row.in_degree as f64,
        SizeMetric::OutDegree => row.out_degree as f64,
        SizeMetric::Betweenness => row.betweenness,
        SizeMetric::Closeness => row.closeness,
        SizeMetric::Eigenvector => row.eigenvector,
    }
}

fn adjacency_view(graph: &TransferGraph) -> AdjacencyView {
    let matrix = stats::adjacency_top_degree(graph, ADJACENCY_LIMIT);
    AdjacencyView {
        labels: matrix.labels,
        cells: matrix.cells,
    }
}

/// Renderer options mirroring the interaction model: labels hidden until
/// hover, tooltips after a short delay, barnesHut physics when enabled.
fn vis_options(physics: bool) -> serde_json::Value {
    let physics_options = if physics {
        serde_json::json!({
            "enabled": true,
            "barnesHut": {
                "gravitationalConstant": -80000,
                "centralGravity": 0.3,
                "springLength": 250,
                "springConstant": 0.001,
                "damping": 0.09,
                "avoidOverlap": 0.1
            }
        })
    } else {
        serde_json::json!({ "enabled": false })
    };

    serde_json::json!({
        "nodes": { "font": { "size": 0, "face": "arial" } },
        "edges": { "font": { "size": 0 } },
        "interaction": { "hover": true, "tooltipDelay": 200 },
        "physics": physics_options,
    })
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

    fn sample_records() -> Vec<TransferRecord> {
        vec![
            record("A", "B", Dir::Out, 5e6),
            record("A", "B", Dir::Out, 3e6),
            record("C", "A", Dir::In, 10e6),
        ]
    }

    #[test]
    fn pipeline_produces_aggregated_edges() {
        let data =
            run_pipeline(&sample_records(), &RenderParams::default()).expect("should run");

        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);

        let ab = data
            .edges
            .iter()
            .find(|e| e.from == "A" && e.to == "B")
            .expect("A->B edge");
        assert!(ab.title.contains("Transfers: 2"));
        assert!(ab.title.contains("€8.00M"));
    }

    #[test]
    fn node_sizes_respect_the_physics_range() {
        let params = RenderParams {
            physics: true,
            ..RenderParams::default()
        };
        let data = run_pipeline(&sample_records(), &params).expect("should run");
        for node in &data.nodes {
            assert!((10.0..=50.0).contains(&node.size), "size {}", node.size);
        }

        let params = RenderParams {
            physics: false,
            ..params
        };
        let data = run_pipeline(&sample_records(), &params).expect("should run");
        for node in &data.nodes {
            assert!((5.0..=30.0).contains(&node.size), "size {}", node.size);
        }
    }

    #[test]
    fn negative_fee_threshold_is_rejected() {
        let params = RenderParams {
            min_fee_millions: -1.0,
            ..RenderParams::default()
        };
        assert!(run_pipeline(&sample_records(), &params).is_err());
    }

    #[test]
    fn empty_result_is_a_terminal_error() {
        let params = RenderParams {
            min_fee_millions: 1000.0,
            ..RenderParams::default()
        };
        let err = run_pipeline(&sample_records(), &params).expect_err("should fail");
        assert!(err.to_string().contains("no transfers"));
    }

    #[test]
    fn rankings_cover_every_metric_with_at_most_ten_rows() {
        let data =
            run_pipeline(&sample_records(), &RenderParams::default()).expect("should run");

        assert_eq!(data.rankings.len(), 6);
        for table in &data.rankings {
            assert!(table.rows.len() <= RANKING_LIMIT);
            assert!(!table.rows.is_empty());
        }
    }

    #[test]
    fn fee_summary_ignores_component_restriction() {
        // Two islands; connected-only keeps one, but money totals cover both.
        let records = vec![
            record("A", "B", Dir::Out, 5e6),
            record("A", "C", Dir::Out, 5e6),
            record("X", "Y", Dir::Out, 7e6),
        ];
        let data = run_pipeline(&records, &RenderParams::default()).expect("should run");

        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.summary.transfers, 3);
        assert!((data.summary.total_fee_millions - 17.0).abs() < 1e-9);
    }

    #[test]
    fn payload_serializes_to_json() {
        let data =
            run_pipeline(&sample_records(), &RenderParams::default()).expect("should run");
        let json = serde_json::to_string(&data).expect("should serialize");

        assert!(json.contains("\"degree_histogram\""));
        assert!(json.contains("\"adjacency\""));
        assert!(json.contains("\"barnesHut\""));
    }

    #[test]
    fn physics_off_disables_simulation_options() {
        let params = RenderParams {
            physics: false,
            ..RenderParams::default()
        };
        let data = run_pipeline(&sample_records(), &params).expect("should run");
        assert_eq!(data.options["physics"]["enabled"], false);
    }
}
