//! Dependency metrics over the call graph
//!
//! Independent of propagation. Every query starts from fresh traversal
//! state, so nodes can be resolved in parallel.
//!
//! - stability   = fan_in / (fan_in + fan_out), 1.0 with no edges
//! - instability = fan_out / (fan_in + fan_out), 0.0 with no edges
//! - coupling    = min(1, (fan_in + fan_out) / 100)
//! - transitive  = nodes reachable over outbound edges, each counted once
//! - circular    = distinct back-edges met during a DFS from the node

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::CallGraphQuery;

/// Edge total at which coupling strength saturates
const COUPLING_SATURATION: f64 = 100.0;

pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyMetrics {
    pub fan_in: usize,
    pub fan_out: usize,
    pub stability: f64,
    pub instability: f64,
    pub coupling_strength: f64,
    pub transitive_dependencies: usize,
    pub cycle_back_edges: usize,
    pub has_circular_deps: bool,
    /// A traversal hit the depth cap; counts are lower bounds
    pub depth_limited: bool,
}

pub struct DependencyResolver<'g, G: CallGraphQuery + ?Sized> {
    graph: &'g G,
    max_depth: usize,
}

impl<'g, G: CallGraphQuery + ?Sized> DependencyResolver<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self {
            graph,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn metrics(&self, idx: usize) -> DependencyMetrics {
        let fan_in = self.graph.fan_in(idx);
        let fan_out = self.graph.fan_out(idx);
        let total = fan_in + fan_out;

        let (stability, instability) = if total == 0 {
            (1.0, 0.0)
        } else {
            (
                fan_in as f64 / total as f64,
                fan_out as f64 / total as f64,
            )
        };

        let (transitive, transitive_capped) = self.transitive_count(idx);
        let (back_edges, cycle_capped) = self.back_edges(idx);

        DependencyMetrics {
            fan_in,
            fan_out,
            stability,
            instability,
            coupling_strength: (total as f64 / COUPLING_SATURATION).min(1.0),
            transitive_dependencies: transitive,
            cycle_back_edges: back_edges,
            has_circular_deps: back_edges > 0,
            depth_limited: transitive_capped || cycle_capped,
        }
    }

    /// Metrics for every node, in index order
    pub fn resolve_all(&self) -> Vec<DependencyMetrics>
    where
        G: Sync,
    {
        let all: Vec<DependencyMetrics> = (0..self.graph.node_count())
            .into_par_iter()
            .map(|i| self.metrics(i))
            .collect();

        let circular = all.iter().filter(|m| m.has_circular_deps).count();
        let limited = all.iter().filter(|m| m.depth_limited).count();
        debug!(
            "Dependency metrics: {} nodes, {} with circular deps, {} depth-limited",
            all.len(),
            circular,
            limited
        );
        all
    }

    /// Distinct nodes reachable from `idx`, and whether the cap cut the walk short
    pub fn transitive_count(&self, idx: usize) -> (usize, bool) {
        let mut best_depth = FxHashMap::default();
        let mut capped = false;
        self.dfs_transitive(idx, 0, &mut best_depth, &mut capped);
        (best_depth.len() - 1, capped)
    }

    /// A node first met deep in the walk is expanded again when a shorter path reaches it.
    fn dfs_transitive(
        &self,
        idx: usize,
        depth: usize,
        best_depth: &mut FxHashMap<usize, usize>,
        capped: &mut bool,
    ) {
        best_depth.insert(idx, depth);
        let callees = self.graph.callees(idx);
        if depth >= self.max_depth {
            *capped |= !callees.is_empty();
            return;
        }
        for &target in callees {
            if best_depth.get(&target).map_or(true, |&d| depth + 1 < d) {
                self.dfs_transitive(target, depth + 1, best_depth, capped);
            }
        }
    }

    /// Distinct back-edges found by a DFS rooted at `idx`
    pub fn back_edges(&self, idx: usize) -> (usize, bool) {
        let mut best_depth = FxHashMap::default();
        let mut on_stack = FxHashSet::default();
        let mut found = FxHashSet::default();
        let mut capped = false;
        self.dfs_cycles(
            idx,
            0,
            &mut best_depth,
            &mut on_stack,
            &mut found,
            &mut capped,
        );
        (found.len(), capped)
    }

    fn dfs_cycles(
        &self,
        idx: usize,
        depth: usize,
        best_depth: &mut FxHashMap<usize, usize>,
        on_stack: &mut FxHashSet<usize>,
        found: &mut FxHashSet<(usize, usize)>,
        capped: &mut bool,
    ) {
        best_depth.insert(idx, depth);
        let callees = self.graph.callees(idx);
        if depth >= self.max_depth {
            *capped |= !callees.is_empty();
            return;
        }
        on_stack.insert(idx);

        for &target in callees {
            if on_stack.contains(&target) {
                found.insert((idx, target));
            } else if best_depth.get(&target).map_or(true, |&d| depth + 1 < d) {
                self.dfs_cycles(target, depth + 1, best_depth, on_stack, found, capped);
            }
        }

        on_stack.remove(&idx);
    }
}
