//! Transfer flow graph construction.
//!
//! Builds a simple directed graph where nodes are clubs and each edge
//! aggregates every transfer for one ordered club pair. This is the one
//! place multiplicity is absorbed: repeated moves between the same pair
//! become a single edge carrying a count, a fee total, and a fee average.
//!
//! Edge direction follows money-for-player flow: the selling club is the
//! source, the buying club the destination (see [`TransferRecord::flow`]).

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tfn_data::TransferRecord;

/// Aggregated flow between one ordered pair of clubs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    /// Number of transfers collapsed into this edge.
    pub transfers: u32,
    /// Sum of fees across those transfers, base currency units.
    pub total_fee: f64,
    /// `total_fee / transfers`.
    pub avg_fee: f64,
}

/// Options applied when building from raw records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Keep records with a fee of at least this many millions.
    pub min_fee_millions: f64,
    /// Restrict the result to the largest weakly-connected component.
    pub connected_only: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            min_fee_millions: 1.0,
            connected_only: true,
        }
    }
}

/// Directed club-to-club transfer graph.
///
/// Nodes are club names. Simple-directed by construction: at most one
/// edge per ordered pair.
pub struct TransferGraph {
    /// The underlying petgraph directed graph.
    pub graph: DiGraph<String, FlowEdge>,
    /// Lookup from club name to node index.
    pub club_to_ix: HashMap<String, NodeIndex>,
}

/// Records at or above the fee threshold (threshold given in millions).
pub fn filter_records(records: &[TransferRecord], min_fee_millions: f64) -> Vec<&TransferRecord> {
    let threshold = min_fee_millions * 1e6;
    records.iter().filter(|r| r.fee >= threshold).collect()
}

/// Filter, aggregate, and optionally restrict to the largest component.
pub fn build(records: &[TransferRecord], opts: &BuildOptions) -> TransferGraph {
    let kept = filter_records(records, opts.min_fee_millions);
    let graph = TransferGraph::from_records(kept.iter().copied());
    if opts.connected_only {
        graph.largest_weak_component()
    } else {
        graph
    }
}

impl TransferGraph {
    /// Aggregate pre-filtered records into the flow graph.
    ///
    /// Nodes and edge keys are created in first-encountered order, which
    /// keeps node indices (and every downstream tie-break) deterministic
    /// for a given record sequence.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransferRecord>,
    {
        let mut graph = DiGraph::new();
        let mut club_to_ix: HashMap<String, NodeIndex> = HashMap::new();
        let mut order: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        let mut totals: HashMap<(NodeIndex, NodeIndex), (u32, f64)> = HashMap::new();

        for record in records {
            let (source, target) = record.flow();
            let source_ix = intern(&mut graph, &mut club_to_ix, source);
            let target_ix = intern(&mut graph, &mut club_to_ix, target);

            let entry = totals.entry((source_ix, target_ix)).or_insert_with(|| {
                order.push((source_ix, target_ix));
                (0, 0.0)
            });
            entry.0 += 1;
            entry.1 += record.fee;
        }

        for key in order {
            let (transfers, total_fee) = totals[&key];
            graph.add_edge(
                key.0,
                key.1,
                FlowEdge {
                    transfers,
                    total_fee,
                    avg_fee: total_fee / f64::from(transfers),
                },
            );
        }

        Self { graph, club_to_ix }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Club name for a node index.
    pub fn club(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    /// In-degree + out-degree.
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges_directed(node, Direction::Incoming).count()
    }

    pub fn out_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges_directed(node, Direction::Outgoing).count()
    }

    /// Aggregated edge between two clubs, if any transfer flowed that way.
    pub fn flow_between(&self, source: &str, target: &str) -> Option<&FlowEdge> {
        let source_ix = *self.club_to_ix.get(source)?;
        let target_ix = *self.club_to_ix.get(target)?;
        let edge = self.graph.find_edge(source_ix, target_ix)?;
        Some(&self.graph[edge])
    }

    /// Weakly-connected components, direction ignored.
    ///
    /// Components are emitted in order of their lowest contained node
    /// index, members in visit order.
    pub fn weak_components(&self) -> Vec<Vec<NodeIndex>> {
        let mut seen = vec![false; self.graph.node_count()];
        let mut components = Vec::new();

        for start in self.graph.node_indices() {
            if seen[start.index()] {
                continue;
            }
            seen[start.index()] = true;
            let mut stack = vec![start];
            let mut members = Vec::new();

            while let Some(node) = stack.pop() {
                members.push(node);
                for next in self.graph.neighbors_undirected(node) {
                    if !seen[next.index()] {
                        seen[next.index()] = true;
                        stack.push(next);
                    }
                }
            }
            components.push(members);
        }

        components
    }

    /// Copy of the graph restricted to its largest weakly-connected
    /// component.
    ///
    /// Ties on size go to the component encountered first, i.e. the one
    /// containing the lowest node index. Implementation-defined on
    /// purpose; callers must not rely on a stronger rule.
    pub fn largest_weak_component(&self) -> TransferGraph {
        let components = self.weak_components();

        let mut largest: Option<&Vec<NodeIndex>> = None;
        for component in &components {
            if largest.is_none_or(|current| component.len() > current.len()) {
                largest = Some(component);
            }
        }

        let Some(members) = largest else {
            return TransferGraph {
                graph: DiGraph::new(),
                club_to_ix: HashMap::new(),
            };
        };

        let keep: HashSet<NodeIndex> = members.iter().copied().collect();
        let mut graph = DiGraph::new();
        let mut club_to_ix = HashMap::new();
        let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        for node in self.graph.node_indices() {
            if !keep.contains(&node) {
                continue;
            }
            let name = self.graph[node].clone();
            let new_ix = graph.add_node(name.clone());
            club_to_ix.insert(name, new_ix);
            remap.insert(node, new_ix);
        }

        for edge in self.graph.edge_references() {
            if keep.contains(&edge.source()) && keep.contains(&edge.target()) {
                graph.add_edge(
                    remap[&edge.source()],
                    remap[&edge.target()],
                    edge.weight().clone(),
                );
            }
        }

        TransferGraph { graph, club_to_ix }
    }
}

fn intern(
    graph: &mut DiGraph<String, FlowEdge>,
    club_to_ix: &mut HashMap<String, NodeIndex>,
    name: &str,
) -> NodeIndex {
    match club_to_ix.get(name) {
        Some(&ix) => ix,
        None => {
            let ix = graph.add_node(name.to_string());
            club_to_ix.insert(name.to_string(), ix);
            ix
        }
    }
}
