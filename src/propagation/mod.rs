//! Score propagation over the call graph
//!
//! Pressure flows from callees up to their callers. Two interchangeable
//! strategies implement [`PropagationStrategy`]:
//!
//! ```text
//! Resolved accumulation (every node carries a resolved symbol)
//!   score[n] = direct[n] + Σ_{c ∈ callees(n), c resolved} damping[n] × prev[c]
//!   damping[n] = hints.propagation_weight | 0.85, × min(1, bound/10) for bounded loops
//!   stop: max |Δ| < 0.001 or 20 iterations
//!   propagated[n] = score[n] − direct[n]
//!
//! Name-indexed ranking (fallback)
//!   score[n] = (1 − d)/N + d × Σ_{c ∈ callees(n)} prev[c] / callers(c)
//!   stop: max |Δ| < 0.0001 or 100 iterations
//!   propagated[n] = score[n] × 100
//! ```
//!
//! Cycles are expected. The iteration cap is what guarantees termination,
//! not convergence.

pub mod name_indexed;
pub mod resolved;

pub use name_indexed::NameIndexedRank;
pub use resolved::ResolvedAccumulation;

use crate::cancellation::CancellationToken;
use crate::config::{PropagationConfig, PropagationMode};
use crate::graph::CallGraph;
use crate::models::{PropagationReport, StrategyKind};

/// Result of one propagation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropagationOutcome {
    /// Per node index, the pressure received from callees
    pub propagated: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub cancelled: bool,
}

impl PropagationOutcome {
    pub fn report(&self, strategy: StrategyKind) -> PropagationReport {
        PropagationReport {
            strategy,
            iterations: self.iterations,
            converged: self.converged,
            cancelled: self.cancelled,
        }
    }
}

pub trait PropagationStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// `direct` is indexed like the graph's nodes.
    fn run(
        &self,
        graph: &CallGraph,
        direct: &[f64],
        cancel: &CancellationToken,
    ) -> PropagationOutcome;
}

/// Pick the strategy for a frozen graph.
pub fn select_strategy(
    config: &PropagationConfig,
    graph: &CallGraph,
) -> Box<dyn PropagationStrategy> {
    let resolved = match config.mode {
        PropagationMode::Resolved => true,
        PropagationMode::NameIndexed => false,
        PropagationMode::Auto => graph.is_fully_resolved(),
    };
    if resolved {
        Box::new(ResolvedAccumulation::from_config(config))
    } else {
        Box::new(NameIndexedRank::from_config(config))
    }
}

/// Largest absolute element-wise difference
pub(crate) fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Keep scores finite under runaway accumulation
pub(crate) fn clamp_finite(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else if v.is_infinite() {
        if v > 0.0 {
            f64::MAX
        } else {
            f64::MIN
        }
    } else {
        v
    }
}

#[cfg(test)]
mod tests;
