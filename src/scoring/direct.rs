//! Direct score collector
//!
//! Turns a function's own call sites into one weighted local score.

use crate::models::{FunctionRecord, Hints, LoopDescriptor};
use serde::{Deserialize, Serialize};

use super::weights::CallWeights;

/// Flat overhead added for every call made inside a loop
pub const LOOP_CALL_OVERHEAD: f64 = 0.5;

/// Multiplier for in-loop calls in a function that reported no loops
pub const DEFAULT_LOOP_MULTIPLIER: f64 = 10.0;

/// Local score of one function, split by where the calls happen
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectScore {
    /// Sum of in-loop contributions, including the per-call overhead
    pub loop_pressure: f64,
    /// Sum of out-of-loop contributions
    pub call_pressure: f64,
    pub call_sites: usize,
    pub loop_call_sites: usize,
}

impl DirectScore {
    pub fn total(&self) -> f64 {
        self.loop_pressure + self.call_pressure
    }
}

/// Multiplier applied to in-loop calls of a function.
///
/// Annotation wins; otherwise the largest estimate among the function's loops.
pub fn loop_multiplier(hints: Option<&Hints>, loops: &[LoopDescriptor]) -> f64 {
    if let Some(declared) = hints.and_then(Hints::loop_override) {
        return declared;
    }
    loops
        .iter()
        .map(|l| l.kind.iteration_estimate())
        .reduce(f64::max)
        .unwrap_or(DEFAULT_LOOP_MULTIPLIER)
}

pub struct DirectScorer<'w> {
    weights: &'w dyn CallWeights,
}

impl<'w> DirectScorer<'w> {
    pub fn new(weights: &'w dyn CallWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, record: &FunctionRecord) -> DirectScore {
        let multiplier = loop_multiplier(record.hints.as_ref(), &record.loops);
        let mut score = DirectScore::default();

        for call in &record.calls {
            let weight = self.weights.weight(&record.language, &call.target);
            if call.in_loop {
                score.loop_pressure += weight * multiplier + LOOP_CALL_OVERHEAD;
                score.loop_call_sites += 1;
            } else {
                score.call_pressure += weight;
            }
            score.call_sites += 1;
        }

        score
    }
}
