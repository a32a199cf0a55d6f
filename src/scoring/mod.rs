//! Direct scoring
//!
//! A function's direct score only looks at its own call sites:
//!
//! ```text
//! direct = Σ out-of-loop calls: weight(target)
//!        + Σ in-loop calls:     weight(target) × loop_multiplier + 0.5
//!
//! loop_multiplier = hints.loop_weight
//!                 | hints.loop_bounded
//!                 | max(estimate(kind) for each loop)   for=10 while=20 for-each=10
//!                 | 10                                  function reported no loops
//! ```
//!
//! `weight` comes from a language-keyed pattern table and is 0.1 for
//! anything unrecognized.

pub mod direct;
pub mod weights;

pub use direct::{loop_multiplier, DirectScore, DirectScorer};
pub use weights::{default_table, AllocationCategory, AllocationPattern, CallWeights, WeightTable};
