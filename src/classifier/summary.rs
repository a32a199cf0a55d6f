//! Aggregate counts for an analysis run

use crate::models::{ScoreRecord, Severity, Summary};
use crate::scoring::DirectScore;

impl Summary {
    /// `direct` holds the raw measurements, one per function, in any order.
    pub fn from_scores(
        scores: &[ScoreRecord],
        direct: &[DirectScore],
        dropped_calls: usize,
    ) -> Self {
        let mut summary = Self {
            total_functions: scores.len(),
            dropped_calls,
            ..Default::default()
        };

        for d in direct {
            summary.total_call_sites += d.call_sites;
            summary.loop_call_sites += d.loop_call_sites;
            summary.max_call_sites_in_function =
                summary.max_call_sites_in_function.max(d.call_sites);
            summary.total_direct_score += d.total();
        }
        if !direct.is_empty() {
            let n = direct.len() as f64;
            summary.avg_call_sites_per_function = summary.total_call_sites as f64 / n;
            summary.avg_direct_score = summary.total_direct_score / n;
        }

        for s in scores {
            match s.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Excluded => summary.excluded += 1,
            }
            if s.is_test_file {
                summary.test_files += 1;
            }
            if s.dependencies.has_circular_deps {
                summary.circular += 1;
            }
        }

        summary
    }
}
