//! Name-indexed ranking for graphs without full symbol resolution
//!
//! A damped PageRank over the name-matched graph with the edge direction
//! reversed: a callee's score is shared among its callers, so the
//! normalizer is the callee's caller count (duplicate calls included).

use tracing::debug;

use super::{clamp_finite, max_abs_diff, PropagationOutcome, PropagationStrategy};
use crate::cancellation::CancellationToken;
use crate::config::PropagationConfig;
use crate::graph::{CallGraph, CallGraphQuery};
use crate::models::StrategyKind;

#[derive(Debug, Clone, PartialEq)]
pub struct NameIndexedRank {
    pub damping: f64,
    pub max_iterations: usize,
    pub threshold: f64,
    pub scale: f64,
}

impl Default for NameIndexedRank {
    fn default() -> Self {
        Self::from_config(&PropagationConfig::default())
    }
}

impl NameIndexedRank {
    pub fn from_config(config: &PropagationConfig) -> Self {
        Self {
            damping: config.fallback_damping,
            max_iterations: config.fallback_max_iterations,
            threshold: config.fallback_threshold,
            scale: config.fallback_scale,
        }
    }
}

impl PropagationStrategy for NameIndexedRank {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NameIndexed
    }

    fn run(
        &self,
        graph: &CallGraph,
        direct: &[f64],
        cancel: &CancellationToken,
    ) -> PropagationOutcome {
        let n = graph.node_count();
        if n == 0 {
            return PropagationOutcome {
                converged: true,
                ..Default::default()
            };
        }

        let d = self.damping;
        let base = (1.0 - d) / n as f64;
        let mut scores = direct.to_vec();
        let mut outcome = PropagationOutcome::default();

        for iter in 0..self.max_iterations {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            let prev = scores.clone();
            for (i, score) in scores.iter_mut().enumerate() {
                let inflow: f64 = graph
                    .callees(i)
                    .iter()
                    .map(|&c| prev[c] / graph.fan_in(c).max(1) as f64)
                    .sum();
                *score = clamp_finite(base + d * inflow);
            }
            outcome.iterations = iter + 1;

            if max_abs_diff(&scores, &prev) < self.threshold {
                outcome.converged = true;
                break;
            }
        }

        if !outcome.converged {
            debug!(
                "Name-indexed ranking stopped after {} iterations without converging",
                outcome.iterations
            );
        }

        // Seed values are direct scores, not ranks; nothing ran, nothing propagated
        if outcome.iterations == 0 {
            outcome.propagated = vec![0.0; n];
            return outcome;
        }

        outcome.propagated = scores
            .iter()
            .map(|s| clamp_finite(s * self.scale))
            .collect();
        outcome
    }
}
