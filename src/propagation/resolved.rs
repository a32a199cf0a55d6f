//! Resolved accumulation
//!
//! Callers accumulate a damped share of each resolved callee's score on top
//! of their own direct score. Updates are computed from the previous
//! iteration's snapshot, so node order does not affect the result.

use tracing::debug;

use super::{clamp_finite, max_abs_diff, PropagationOutcome, PropagationStrategy};
use crate::cancellation::CancellationToken;
use crate::config::PropagationConfig;
use crate::graph::{CallGraph, CallGraphQuery, FunctionNode};
use crate::models::StrategyKind;

/// A declared loop bound at or above this keeps full damping
const BOUND_REFERENCE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAccumulation {
    pub damping: f64,
    pub max_iterations: usize,
    pub threshold: f64,
}

impl Default for ResolvedAccumulation {
    fn default() -> Self {
        Self::from_config(&PropagationConfig::default())
    }
}

impl ResolvedAccumulation {
    pub fn from_config(config: &PropagationConfig) -> Self {
        Self {
            damping: config.damping,
            max_iterations: config.resolved_max_iterations,
            threshold: config.resolved_threshold,
        }
    }

    /// Damping for one node after hint overrides.
    pub fn damping_for(&self, node: &FunctionNode) -> f64 {
        let hints = node.hints();
        let mut damping = hints
            .and_then(|h| h.propagation_weight)
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(self.damping);

        if let Some(bound) = node.loop_bound() {
            damping *= (f64::from(bound) / BOUND_REFERENCE).min(1.0);
        }
        damping
    }
}

impl PropagationStrategy for ResolvedAccumulation {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Resolved
    }

    fn run(
        &self,
        graph: &CallGraph,
        direct: &[f64],
        cancel: &CancellationToken,
    ) -> PropagationOutcome {
        let n = graph.node_count();
        let damping: Vec<f64> = (0..n).map(|i| self.damping_for(graph.node(i))).collect();
        let resolved_callees: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                graph
                    .callees(i)
                    .iter()
                    .copied()
                    .filter(|&c| graph.is_resolved(c))
                    .collect()
            })
            .collect();

        let mut scores = direct.to_vec();
        let mut outcome = PropagationOutcome::default();

        for iter in 0..self.max_iterations {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            let prev = scores.clone();
            for i in 0..n {
                let inflow: f64 = resolved_callees[i]
                    .iter()
                    .map(|&c| damping[i] * prev[c])
                    .sum();
                scores[i] = clamp_finite(direct[i] + inflow);
            }
            outcome.iterations = iter + 1;

            let delta = max_abs_diff(&scores, &prev);
            if delta < self.threshold {
                outcome.converged = true;
                break;
            }
        }

        if !outcome.converged {
            debug!(
                "Resolved accumulation stopped after {} iterations without converging",
                outcome.iterations
            );
        }

        outcome.propagated = scores
            .iter()
            .zip(direct)
            .map(|(s, d)| clamp_finite(s - d))
            .collect();
        outcome
    }
}
