//! Ranking and severity classification
//!
//! Adjustments run in a fixed order before ranking:
//! 1. test-file penalty (unless test files are included)
//! 2. call-frequency multiplier
//! 3. exclusion, which forces the total to exactly 0
//!
//! Percentiles are computed over non-excluded nodes only.

pub mod hotspots;
pub mod summary;
pub mod test_files;

pub use hotspots::{derive_hotspots, reason_for};
pub use test_files::TestFilePatterns;

use std::cmp::Ordering;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::graph::FunctionNode;
use crate::models::{ScoreRecord, Severity};

/// External predicate removing functions from ranking
pub trait ExclusionChecker: Send + Sync {
    fn is_excluded(&self, node: &FunctionNode) -> bool;
}

impl<F> ExclusionChecker for F
where
    F: Fn(&FunctionNode) -> bool + Send + Sync,
{
    fn is_excluded(&self, node: &FunctionNode) -> bool {
        self(node)
    }
}

/// `100 × |{s' ∈ sorted : s' <= score}| / |sorted|`; `sorted` must be ascending.
pub fn percentile(score: f64, sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let at_or_below = sorted.partition_point(|s| *s <= score);
    at_or_below as f64 / sorted.len() as f64 * 100.0
}

#[derive(Debug, Clone)]
pub struct Classifier {
    include_test_files: bool,
    test_file_penalty: f64,
    patterns: TestFilePatterns,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl Classifier {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            include_test_files: config.include_test_files,
            test_file_penalty: config.test_file_penalty,
            patterns: config.test_file_patterns.clone(),
        }
    }

    pub fn is_test_file(&self, file_path: &str) -> bool {
        self.patterns.is_test_file(file_path)
    }

    /// Apply penalty, frequency and exclusion to one record's total.
    ///
    /// Expects `total_score == direct + propagated` and `is_excluded` already set.
    pub fn adjust(&self, record: &mut ScoreRecord) {
        record.is_test_file = self.is_test_file(&record.file_path);

        let mut total = record.raw_total();
        if record.is_test_file && !self.include_test_files {
            total *= self.test_file_penalty;
        }
        if let Some(freq) = &record.call_frequency {
            total *= freq.multiplier();
        }
        if record.is_excluded {
            total = 0.0;
        }
        record.total_score = total;
    }

    /// Assign percentile and severity, then order by descending total.
    pub fn rank(&self, records: &mut [ScoreRecord]) {
        let mut population: Vec<f64> = records
            .iter()
            .filter(|r| !r.is_excluded)
            .map(|r| r.total_score)
            .collect();
        population.sort_by(f64::total_cmp);

        for record in records.iter_mut() {
            if record.is_excluded {
                record.percentile = 0.0;
                record.severity = Severity::Excluded;
            } else {
                record.percentile = percentile(record.total_score, &population);
                record.severity = Severity::from_percentile(record.percentile);
            }
        }

        records.sort_by(descending_total);
    }

    /// Adjust and rank in one pass.
    pub fn classify(&self, mut records: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
        for record in records.iter_mut() {
            self.adjust(record);
        }
        self.rank(&mut records);

        debug!(
            "Classified {} functions: {} critical, {} high, {} excluded",
            records.len(),
            records
                .iter()
                .filter(|r| r.severity == Severity::Critical)
                .count(),
            records.iter().filter(|r| r.severity == Severity::High).count(),
            records.iter().filter(|r| r.is_excluded).count(),
        );
        records
    }
}

/// Descending total, ties broken by name, path and id so output is stable
fn descending_total(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.file_path.cmp(&b.file_path))
        .then_with(|| a.node_id.cmp(&b.node_id))
}
