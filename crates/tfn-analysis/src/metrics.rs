//! Per-club centrality measures.
//!
//! Degree counts come straight from the graph. Betweenness, closeness, and
//! eigenvector centrality are computed here with the classic algorithms
//! (Brandes, per-node BFS, power iteration) in their directed forms:
//! betweenness follows directed shortest paths, closeness uses incoming
//! distance, and eigenvector scores flow along in-edges so a club is
//! important when important clubs sell to it.
//!
//! All measures are recomputed from scratch on every build; nothing here
//! caches across graphs.

use std::collections::VecDeque;

use clap::ValueEnum;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::builder::TransferGraph;

/// Iteration cap for the eigenvector power method.
pub const EIGENVECTOR_MAX_ITER: usize = 1000;
const EIGENVECTOR_TOLERANCE: f64 = 1e-6;

/// The measure used to scale node sizes in the rendered network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    Degree,
    InDegree,
    OutDegree,
    Betweenness,
    Closeness,
    Eigenvector,
}

impl SizeMetric {
    /// Human-readable label for table headers and captions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Degree => "Total degree",
            Self::InDegree => "In-degree",
            Self::OutDegree => "Out-degree",
            Self::Betweenness => "Betweenness",
            Self::Closeness => "Closeness",
            Self::Eigenvector => "Eigenvector",
        }
    }

    pub const ALL: [SizeMetric; 6] = [
        SizeMetric::Degree,
        SizeMetric::InDegree,
        SizeMetric::OutDegree,
        SizeMetric::Betweenness,
        SizeMetric::Closeness,
        SizeMetric::Eigenvector,
    ];
}

/// All measures for one club, attached after every build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMetrics {
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: f64,
}

impl NodeMetrics {
    /// The value of one selected measure, as a float for scaling.
    pub fn value(&self, metric: SizeMetric) -> f64 {
        match metric {
            SizeMetric::Degree => self.degree as f64,
            SizeMetric::InDegree => self.in_degree as f64,
            SizeMetric::OutDegree => self.out_degree as f64,
            SizeMetric::Betweenness => self.betweenness,
            SizeMetric::Closeness => self.closeness,
            SizeMetric::Eigenvector => self.eigenvector,
        }
    }
}

/// Compute every per-club measure, indexed by node index.
pub fn compute(graph: &TransferGraph) -> Vec<NodeMetrics> {
    let betweenness = betweenness(graph);
    let closeness = closeness(graph);
    let eigenvector = eigenvector(graph, EIGENVECTOR_MAX_ITER);

    graph
        .graph
        .node_indices()
        .map(|node| NodeMetrics {
            degree: graph.degree(node),
            in_degree: graph.in_degree(node),
            out_degree: graph.out_degree(node),
            betweenness: betweenness[node.index()],
            closeness: closeness[node.index()],
            eigenvector: eigenvector[node.index()],
        })
        .collect()
}

/// Brandes betweenness centrality over directed shortest paths.
///
/// Normalized by `(n-1)(n-2)`, the number of ordered pairs a node can
/// mediate in a directed graph.
pub fn betweenness(graph: &TransferGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    if n <= 2 {
        return centrality;
    }

    for source in graph.graph.node_indices() {
        let s = source.index();

        let mut visit_order: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut path_counts = vec![0.0_f64; n];
        let mut distance = vec![usize::MAX; n];

        path_counts[s] = 1.0;
        distance[s] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            let v = node.index();
            visit_order.push(v);

            for next in graph.graph.neighbors_directed(node, Direction::Outgoing) {
                let w = next.index();
                if distance[w] == usize::MAX {
                    distance[w] = distance[v] + 1;
                    queue.push_back(next);
                }
                if distance[w] == distance[v] + 1 {
                    path_counts[w] += path_counts[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut dependency = vec![0.0_f64; n];
        for &w in visit_order.iter().rev() {
            for &v in &predecessors[w] {
                dependency[v] += path_counts[v] / path_counts[w] * (1.0 + dependency[w]);
            }
            if w != s {
                centrality[w] += dependency[w];
            }
        }
    }

    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    for value in &mut centrality {
        *value *= scale;
    }

    centrality
}

/// Closeness centrality on incoming distance.
///
/// For each club the BFS walks edges backwards, so the distances are
/// those of clubs that can reach it: `(reachable - 1) / Σ d(u, v)`,
/// zero when nothing reaches the club.
pub fn closeness(graph: &TransferGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];

    for target in graph.graph.node_indices() {
        let mut distance = vec![usize::MAX; n];
        distance[target.index()] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(target);

        let mut total = 0usize;
        let mut reachable = 1usize;

        while let Some(node) = queue.pop_front() {
            for prev in graph.graph.neighbors_directed(node, Direction::Incoming) {
                let u = prev.index();
                if distance[u] == usize::MAX {
                    distance[u] = distance[node.index()] + 1;
                    total += distance[u];
                    reachable += 1;
                    queue.push_back(prev);
                }
            }
        }

        if total > 0 {
            centrality[target.index()] = (reachable - 1) as f64 / total as f64;
        }
    }

    centrality
}

/// Eigenvector centrality by power iteration on in-edges.
///
/// L2-normalized each round; stops once the L1 change drops below
/// tolerance or after `max_iter` rounds, whichever comes first. The last
/// iterate is returned either way.
pub fn eigenvector(graph: &TransferGraph, max_iter: usize) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut scores = vec![1.0 / n as f64; n];

    for _ in 0..max_iter {
        let mut next = vec![0.0_f64; n];
        for node in graph.graph.node_indices() {
            let v = node.index();
            for prev in graph.graph.neighbors_directed(node, Direction::Incoming) {
                next[v] += scores[prev.index()];
            }
        }

        let norm: f64 = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut next {
                *x /= norm;
            }
        }

        let diff: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;

        if diff < EIGENVECTOR_TOLERANCE {
            break;
        }
    }

    scores
}
