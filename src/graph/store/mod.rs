//! Call graph storage using petgraph
//!
//! Two phases, never overlapping:
//! - [`GraphBuilder`] owns the nodes while records are inserted (single writer)
//! - [`CallGraph`] is the frozen snapshot that scoring and propagation read
//!
//! Edges are derived when the builder is frozen: each call is matched first by
//! resolved symbol, then by name. Calls matching nothing are dropped and counted.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::node_id::NodeId;
use super::traits::{CallGraphQuery, SymbolResolver};
use crate::models::{CallFrequency, FunctionRecord, Hints};

/// A function in the graph
#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub id: NodeId,
    pub record: FunctionRecord,
}

impl FunctionNode {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn file_path(&self) -> &str {
        &self.record.file_path
    }

    pub fn hints(&self) -> Option<&Hints> {
        self.record.hints.as_ref()
    }

    pub fn call_frequency(&self) -> Option<&CallFrequency> {
        self.hints().and_then(|h| h.call_frequency.as_ref())
    }

    /// Declared loop bound, if the node's hints carry a positive one
    pub fn loop_bound(&self) -> Option<u32> {
        self.hints().and_then(Hints::bound)
    }
}

/// How a call edge was matched to its callee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeResolution {
    Symbol,
    Name,
}

/// A call edge (caller -> callee)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub line: u32,
    pub in_loop: bool,
    pub resolution: EdgeResolution,
}

/// Counters collected while building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub nodes: usize,
    pub edges: usize,
    /// Calls whose target is not in the node set
    pub dropped_calls: usize,
    /// Records skipped because their id was already taken
    pub duplicate_ids: usize,
    /// Distinct names sharing a fallback hash; all of them are kept
    pub hash_collisions: usize,
    /// Records skipped for having neither a name nor a symbol
    pub rejected: usize,
}

/// Single-writer build phase
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<FunctionNode>,
    by_id: FxHashMap<NodeId, usize>,
    /// Fallback identity is the name itself; the hash may collide
    fallback_names: FxHashSet<String>,
    resolver: Option<Arc<dyn SymbolResolver>>,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SymbolResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_capacity(mut self, n: usize) -> Self {
        self.nodes.reserve(n);
        self.by_id.reserve(n);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert one record. Returns the id it was stored under, or `None` when skipped.
    pub fn add_record(&mut self, mut record: FunctionRecord) -> Option<NodeId> {
        let symbol = record.symbol_id.filter(|s| *s != 0).or_else(|| {
            self.resolver
                .as_ref()
                .and_then(|r| r.resolve_function(&record))
                .filter(|s| *s != 0)
        });

        if symbol.is_none() && record.name.is_empty() {
            warn!(
                "Skipping unnamed function without symbol in {}",
                record.file_path
            );
            self.stats.rejected += 1;
            return None;
        }

        let id = match symbol {
            Some(s) => NodeId::resolved(s),
            None => NodeId::fallback(&record.name),
        };

        let duplicate = match symbol {
            Some(_) => self.by_id.contains_key(&id),
            None => self.fallback_names.contains(&record.name),
        };
        if duplicate {
            warn!(
                "Duplicate node id {} for {} ({}), keeping first",
                id, record.name, record.file_path
            );
            self.stats.duplicate_ids += 1;
            return None;
        }
        if symbol.is_none() {
            if self.by_id.contains_key(&id) {
                debug!("Fallback hash collision on {} for {}", id, record.name);
                self.stats.hash_collisions += 1;
            }
            self.fallback_names.insert(record.name.clone());
        }

        record.symbol_id = symbol;
        if let Some(resolver) = &self.resolver {
            let resolved: Vec<Option<u64>> = record
                .calls
                .iter()
                .map(|c| match c.target_symbol {
                    Some(s) => Some(s),
                    None => resolver.resolve_call(&record, c),
                })
                .collect();
            for (call, sym) in record.calls.iter_mut().zip(resolved) {
                call.target_symbol = sym;
            }
        }

        // First holder of an id stays the target of id lookups
        self.by_id.entry(id).or_insert(self.nodes.len());
        self.nodes.push(FunctionNode { id, record });
        Some(id)
    }

    pub fn add_records<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = FunctionRecord>,
    {
        records
            .into_iter()
            .filter_map(|r| self.add_record(r))
            .count()
    }

    /// Freeze into a read-only snapshot, deriving edges.
    pub fn build(self) -> CallGraph {
        let GraphBuilder {
            nodes,
            by_id,
            mut stats,
            ..
        } = self;

        // First registration of a name wins
        let mut by_name: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, node) in nodes.iter().enumerate() {
            by_name.entry(node.name()).or_insert(i);
        }

        let mut pending: Vec<(usize, usize, CallEdge)> = Vec::new();
        for (caller, node) in nodes.iter().enumerate() {
            for call in &node.record.calls {
                let by_symbol = call
                    .target_symbol
                    .and_then(|s| by_id.get(&NodeId::resolved(s)).copied());
                let matched = match by_symbol {
                    Some(callee) => Some((callee, EdgeResolution::Symbol)),
                    None => by_name
                        .get(call.target.as_str())
                        .map(|&callee| (callee, EdgeResolution::Name)),
                };
                match matched {
                    Some((callee, resolution)) => pending.push((
                        caller,
                        callee,
                        CallEdge {
                            line: call.line,
                            in_loop: call.in_loop,
                            resolution,
                        },
                    )),
                    None => stats.dropped_calls += 1,
                }
            }
        }
        drop(by_name);

        let mut graph = DiGraph::with_capacity(nodes.len(), pending.len());
        for node in nodes {
            graph.add_node(node);
        }
        let mut callees = vec![Vec::new(); graph.node_count()];
        let mut callers = vec![Vec::new(); graph.node_count()];
        for (from, to, edge) in pending {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), edge);
            callees[from].push(to);
            callers[to].push(from);
        }

        stats.nodes = graph.node_count();
        stats.edges = graph.edge_count();
        let fully_resolved =
            stats.nodes > 0 && graph.node_weights().all(|n: &FunctionNode| n.id.is_resolved());

        debug!(
            "Call graph frozen: {} nodes, {} edges, {} dropped calls, fully resolved: {}",
            stats.nodes, stats.edges, stats.dropped_calls, fully_resolved
        );

        CallGraph {
            graph,
            by_id,
            callees,
            callers,
            fully_resolved,
            stats,
        }
    }
}

/// Frozen call graph
pub struct CallGraph {
    graph: DiGraph<FunctionNode, CallEdge>,
    by_id: FxHashMap<NodeId, usize>,
    callees: Vec<Vec<usize>>,
    callers: Vec<Vec<usize>>,
    fully_resolved: bool,
    stats: BuildStats,
}

impl CallGraph {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FunctionRecord>,
    {
        let mut builder = GraphBuilder::new();
        builder.add_records(records);
        builder.build()
    }

    pub fn node(&self, idx: usize) -> &FunctionNode {
        &self.graph[NodeIndex::new(idx)]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FunctionNode> {
        self.graph.node_weights()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Index of the first node registered under `name`
    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        self.graph
            .node_indices()
            .find(|&i| self.graph[i].name() == name)
            .map(|i| i.index())
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing edges of a node with their call-site data
    pub fn call_edges(&self, idx: usize) -> impl Iterator<Item = (usize, &CallEdge)> {
        self.graph
            .edges_directed(NodeIndex::new(idx), Direction::Outgoing)
            .map(|e| (e.target().index(), e.weight()))
    }

    /// Every node carries a resolved symbol
    pub fn is_fully_resolved(&self) -> bool {
        self.fully_resolved
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl CallGraphQuery for CallGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn callees(&self, idx: usize) -> &[usize] {
        &self.callees[idx]
    }

    fn callers(&self, idx: usize) -> &[usize] {
        &self.callers[idx]
    }

    fn is_resolved(&self, idx: usize) -> bool {
        self.node(idx).id.is_resolved()
    }
}

#[cfg(test)]
mod tests;
