//! Core data models for pressure analysis
//!
//! Input records are produced by per-language front ends and consumed as-is.
//! Output records are assembled once per analysis run and never mutated
//! after [`crate::engine::Analyzer::analyze`] returns.

use crate::dependencies::DependencyMetrics;
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Kind of loop a front end reported.
///
/// Front ends speak in AST node-type names, so the common ones are accepted
/// as aliases (`for_statement`, `while_statement`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    /// Definite-count loops: `for`, `for range`
    #[serde(alias = "for_statement", alias = "for_range_statement", alias = "for_range")]
    For,
    /// Indefinite loops: `while`, `do while`, `loop`
    #[serde(
        alias = "while_statement",
        alias = "do_while_statement",
        alias = "do_while",
        alias = "do_statement",
        alias = "loop_expression"
    )]
    While,
    /// Collection iteration: `for in`, `for of`, `forEach`
    #[serde(
        alias = "for_in_statement",
        alias = "for_of_statement",
        alias = "for_each_statement",
        alias = "for_in",
        alias = "for_of",
        alias = "for_each",
        alias = "enhanced_for_statement",
        alias = "foreach_statement"
    )]
    Collection,
    #[default]
    #[serde(other)]
    Other,
}

impl LoopKind {
    /// Language-agnostic iteration estimate for this kind of loop.
    pub fn iteration_estimate(&self) -> f64 {
        match self {
            LoopKind::For => 10.0,
            LoopKind::While => 20.0, // potentially unbounded
            LoopKind::Collection => 10.0,
            LoopKind::Other => 10.0,
        }
    }
}

/// A loop inside a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoopDescriptor {
    #[serde(default, alias = "node_type")]
    pub kind: LoopKind,
    #[serde(default, alias = "start", alias = "start_line")]
    pub line_start: u32,
    #[serde(default, alias = "end", alias = "end_line")]
    pub line_end: u32,
    #[serde(default)]
    pub depth: u32,
}

impl LoopDescriptor {
    pub fn new(kind: LoopKind, depth: u32) -> Self {
        Self {
            kind,
            depth,
            ..Default::default()
        }
    }
}

/// An outbound call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CallDescriptor {
    /// Call target as written (`helper`, `make([]byte, n)`, `json.Marshal(v)`)
    pub target: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default, alias = "inLoop")]
    pub in_loop: bool,
    #[serde(default, alias = "loopDepth")]
    pub loop_depth: u32,
    /// Resolved symbol of the callee, when the front end could resolve it
    #[serde(default)]
    pub target_symbol: Option<u64>,
}

impl CallDescriptor {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn in_loop(mut self, depth: u32) -> Self {
        self.in_loop = true;
        self.loop_depth = depth.max(1);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn with_target_symbol(mut self, symbol: u64) -> Self {
        self.target_symbol = Some(symbol);
        self
    }
}

/// How often a function is expected to run.
///
/// Unrecognized tags are kept verbatim and scored like [`CallFrequency::HotPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallFrequency {
    HotPath,
    OncePerFile,
    OncePerRequest,
    OncePerSession,
    StartupOnly,
    CliOutput,
    TestOnly,
    Rare,
    Unknown(String),
}

impl CallFrequency {
    /// Score multiplier for this frequency. Unknown tags are never assumed cold.
    pub fn multiplier(&self) -> f64 {
        match self {
            CallFrequency::HotPath => 1.0,
            CallFrequency::OncePerFile => 0.8,
            CallFrequency::OncePerRequest => 0.7,
            CallFrequency::OncePerSession => 0.5,
            CallFrequency::StartupOnly => 0.3,
            CallFrequency::CliOutput => 0.2,
            CallFrequency::TestOnly => 0.1,
            CallFrequency::Rare => 0.1,
            CallFrequency::Unknown(_) => 1.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CallFrequency::HotPath => "hot-path",
            CallFrequency::OncePerFile => "once-per-file",
            CallFrequency::OncePerRequest => "once-per-request",
            CallFrequency::OncePerSession => "once-per-session",
            CallFrequency::StartupOnly => "startup-only",
            CallFrequency::CliOutput => "cli-output",
            CallFrequency::TestOnly => "test-only",
            CallFrequency::Rare => "rare",
            CallFrequency::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for CallFrequency {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "hot-path" => CallFrequency::HotPath,
            "once-per-file" => CallFrequency::OncePerFile,
            "once-per-request" => CallFrequency::OncePerRequest,
            "once-per-session" => CallFrequency::OncePerSession,
            "startup-only" => CallFrequency::StartupOnly,
            "cli-output" => CallFrequency::CliOutput,
            "test-only" => CallFrequency::TestOnly,
            "rare" => CallFrequency::Rare,
            _ => CallFrequency::Unknown(tag.to_string()),
        }
    }
}

impl From<String> for CallFrequency {
    fn from(tag: String) -> Self {
        CallFrequency::from(tag.as_str())
    }
}

impl From<CallFrequency> for String {
    fn from(freq: CallFrequency) -> Self {
        freq.as_str().to_string()
    }
}

impl std::fmt::Display for CallFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-function overrides from source annotations.
///
/// Every field is optional so "not specified" stays distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Hints {
    /// Damping applied to callee pressure flowing into this function
    #[serde(default)]
    pub propagation_weight: Option<f64>,
    /// Declared maximum iteration count of the function's dominant loop
    #[serde(default)]
    pub loop_bounded: Option<u32>,
    /// Explicit loop multiplier; takes precedence over `loop_bounded`
    #[serde(default)]
    pub loop_weight: Option<f64>,
    #[serde(default)]
    pub call_frequency: Option<CallFrequency>,
    /// Exclude this function from ranking entirely
    #[serde(default)]
    pub exclude: bool,
}

impl Hints {
    /// Loop multiplier declared by annotation, if any.
    pub fn loop_override(&self) -> Option<f64> {
        if let Some(w) = self.loop_weight.filter(|w| w.is_finite() && *w > 0.0) {
            return Some(w);
        }
        self.loop_bounded.filter(|b| *b > 0).map(f64::from)
    }

    pub fn bound(&self) -> Option<u32> {
        self.loop_bounded.filter(|b| *b > 0)
    }
}

/// One function as reported by a language front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FunctionRecord {
    /// Fully-qualified function name
    pub name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, alias = "start", alias = "start_line")]
    pub line_start: u32,
    #[serde(default, alias = "end", alias = "end_line")]
    pub line_end: u32,
    #[serde(default)]
    pub loops: Vec<LoopDescriptor>,
    #[serde(default)]
    pub calls: Vec<CallDescriptor>,
    /// Resolved symbol identifier, when symbol resolution succeeded
    #[serde(default)]
    pub symbol_id: Option<u64>,
    #[serde(default)]
    pub hints: Option<Hints>,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>, language: &str) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            language: language.to_string(),
            ..Default::default()
        }
    }

    pub fn with_lines(mut self, start: u32, end: u32) -> Self {
        self.line_start = start;
        self.line_end = end;
        self
    }

    pub fn with_loop(mut self, kind: LoopKind, depth: u32) -> Self {
        self.loops.push(LoopDescriptor::new(kind, depth));
        self
    }

    pub fn with_call(mut self, call: CallDescriptor) -> Self {
        self.calls.push(call);
        self
    }

    pub fn calls_to(mut self, target: &str) -> Self {
        self.calls.push(CallDescriptor::new(target));
        self
    }

    pub fn with_symbol(mut self, symbol: u64) -> Self {
        self.symbol_id = Some(symbol);
        self
    }

    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = Some(hints);
        self
    }
}

/// Severity tier derived from percentile rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Removed from ranking by an exclusion; never thresholded
    Excluded,
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map a percentile (0-100) onto the fixed tier thresholds.
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 95.0 {
            Severity::Critical
        } else if percentile >= 85.0 {
            Severity::High
        } else if percentile >= 70.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn is_hotspot(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Excluded => write!(f, "excluded"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Scores and classification for one function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub node_id: NodeId,
    pub name: String,
    pub file_path: String,
    pub line: u32,
    pub language: String,
    pub direct_score: f64,
    pub propagated_score: f64,
    /// `direct + propagated` after test penalty, frequency multiplier and exclusion
    pub total_score: f64,
    pub percentile: f64,
    pub severity: Severity,
    pub is_excluded: bool,
    pub is_test_file: bool,
    /// Contribution of calls made inside loops
    pub loop_pressure: f64,
    /// Contribution of calls made outside loops
    pub call_pressure: f64,
    #[serde(default)]
    pub call_frequency: Option<CallFrequency>,
    pub has_bounded_loops: bool,
    pub dependencies: DependencyMetrics,
}

impl ScoreRecord {
    /// `direct + propagated` before any adjustment.
    pub fn raw_total(&self) -> f64 {
        self.direct_score + self.propagated_score
    }
}

/// Cause assigned to a hotspot, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotReason {
    BoundedLoop,
    LoopDominant,
    Cascading,
    DirectDominant,
}

impl HotspotReason {
    pub fn description(&self) -> &'static str {
        match self {
            HotspotReason::BoundedLoop => "Allocations in bounded loop",
            HotspotReason::LoopDominant => "High allocation rate inside loops",
            HotspotReason::Cascading => "Cascading memory pressure from callees",
            HotspotReason::DirectDominant => "High direct allocation rate",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            HotspotReason::BoundedLoop => {
                "Loop is bounded; verify iteration count matches the declared bound"
            }
            HotspotReason::LoopDominant => {
                "Consider pre-allocating or moving allocations outside loops"
            }
            HotspotReason::Cascading => "Review callee functions for optimization opportunities",
            HotspotReason::DirectDominant => "Consider object pooling or reducing allocations",
        }
    }
}

impl std::fmt::Display for HotspotReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A function in the top severity tiers with its derived cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub node_id: NodeId,
    pub name: String,
    pub file_path: String,
    pub line: u32,
    pub score: f64,
    pub severity: Severity,
    pub kind: HotspotReason,
    /// Human-readable reason, prefixed with `[frequency] ` when one was declared
    pub reason: String,
    pub suggestion: String,
}

/// Aggregate counts over one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub total_functions: usize,
    pub total_call_sites: usize,
    pub avg_call_sites_per_function: f64,
    pub max_call_sites_in_function: usize,
    pub loop_call_sites: usize,
    pub total_direct_score: f64,
    pub avg_direct_score: f64,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub excluded: usize,
    pub test_files: usize,
    pub circular: usize,
    pub dropped_calls: usize,
}

/// Which propagation strategy ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Resolved,
    #[default]
    NameIndexed,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Resolved => write!(f, "resolved"),
            StrategyKind::NameIndexed => write!(f, "name-indexed"),
        }
    }
}

/// How the fixed-point iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PropagationReport {
    pub strategy: StrategyKind,
    pub iterations: usize,
    pub converged: bool,
    pub cancelled: bool,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Ordered by descending total score
    pub scores: Vec<ScoreRecord>,
    pub summary: Summary,
    pub hotspots: Vec<Hotspot>,
    pub propagation: PropagationReport,
}

impl AnalysisResult {
    pub fn score_of(&self, name: &str) -> Option<&ScoreRecord> {
        self.scores.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_percentile(100.0), Severity::Critical);
        assert_eq!(Severity::from_percentile(95.0), Severity::Critical);
        assert_eq!(Severity::from_percentile(94.9), Severity::High);
        assert_eq!(Severity::from_percentile(85.0), Severity::High);
        assert_eq!(Severity::from_percentile(70.0), Severity::Medium);
        assert_eq!(Severity::from_percentile(69.9), Severity::Low);
        assert_eq!(Severity::from_percentile(0.0), Severity::Low);
    }

    #[test]
    fn test_call_frequency_table() {
        assert_eq!(CallFrequency::from("hot-path").multiplier(), 1.0);
        assert_eq!(CallFrequency::from("once-per-file").multiplier(), 0.8);
        assert_eq!(CallFrequency::from("once-per-request").multiplier(), 0.7);
        assert_eq!(CallFrequency::from("once-per-session").multiplier(), 0.5);
        assert_eq!(CallFrequency::from("startup-only").multiplier(), 0.3);
        assert_eq!(CallFrequency::from("cli-output").multiplier(), 0.2);
        assert_eq!(CallFrequency::from("test-only").multiplier(), 0.1);
        assert_eq!(CallFrequency::from("rare").multiplier(), 0.1);
        // Unknown is never assumed cold
        assert_eq!(CallFrequency::from("sometimes").multiplier(), 1.0);
    }

    #[test]
    fn test_call_frequency_serde() {
        let f: CallFrequency = serde_json::from_str("\"startup_only\"").unwrap();
        assert_eq!(f, CallFrequency::StartupOnly);
        assert_eq!(serde_json::to_string(&f).unwrap(), "\"startup-only\"");

        let unknown: CallFrequency = serde_json::from_str("\"nightly\"").unwrap();
        assert_eq!(unknown, CallFrequency::Unknown("nightly".into()));
        assert_eq!(unknown.to_string(), "nightly");
    }

    #[test]
    fn test_loop_kind_aliases() {
        let rec: LoopDescriptor =
            serde_json::from_str(r#"{"kind": "while_statement", "depth": 2}"#).unwrap();
        assert_eq!(rec.kind, LoopKind::While);
        assert_eq!(rec.kind.iteration_estimate(), 20.0);

        let rec: LoopDescriptor = serde_json::from_str(r#"{"kind": "for_of_statement"}"#).unwrap();
        assert_eq!(rec.kind, LoopKind::Collection);

        let rec: LoopDescriptor = serde_json::from_str(r#"{"kind": "repeat_until"}"#).unwrap();
        assert_eq!(rec.kind, LoopKind::Other);
        assert_eq!(rec.kind.iteration_estimate(), 10.0);
    }

    #[test]
    fn test_front_end_field_names() {
        let rec: LoopDescriptor = serde_json::from_str(
            r#"{"node_type": "while_statement", "start_line": 3, "end_line": 9}"#,
        )
        .unwrap();
        assert_eq!(rec.kind, LoopKind::While);
        assert_eq!((rec.line_start, rec.line_end), (3, 9));

        let rec: LoopDescriptor =
            serde_json::from_str(r#"{"kind": "while", "start": 4, "end": 7, "depth": 1}"#)
                .unwrap();
        assert_eq!(rec.kind, LoopKind::While);
        assert_eq!((rec.line_start, rec.line_end, rec.depth), (4, 7, 1));

        let rec: FunctionRecord = serde_json::from_str(
            r#"{"name": "poll", "start_line": 12, "end_line": 40,
                "loops": [{"node_type": "while_statement", "start_line": 14, "end_line": 30}],
                "calls": [{"target": "make([]byte, 8)", "inLoop": true, "loopDepth": 1}]}"#,
        )
        .unwrap();
        assert_eq!((rec.line_start, rec.line_end), (12, 40));
        assert_eq!(rec.loops[0].kind, LoopKind::While);
        assert_eq!(rec.loops[0].kind.iteration_estimate(), 20.0);
        assert!(rec.calls[0].in_loop);
        assert_eq!(rec.calls[0].loop_depth, 1);
    }

    #[test]
    fn test_hints_loop_override_precedence() {
        let hints = Hints {
            loop_weight: Some(3.0),
            loop_bounded: Some(5),
            ..Default::default()
        };
        assert_eq!(hints.loop_override(), Some(3.0));

        let hints = Hints {
            loop_bounded: Some(5),
            ..Default::default()
        };
        assert_eq!(hints.loop_override(), Some(5.0));

        // Zero is "specified" but not a usable override
        let hints = Hints {
            loop_bounded: Some(0),
            loop_weight: Some(0.0),
            ..Default::default()
        };
        assert_eq!(hints.loop_override(), None);
        assert_eq!(hints.bound(), None);
    }

    #[test]
    fn test_function_record_defaults_from_json() {
        let rec: FunctionRecord = serde_json::from_str(
            r#"{"name": "main", "file_path": "main.go", "language": "go",
                "calls": [{"target": "process", "in_loop": true, "loop_depth": 1}]}"#,
        )
        .unwrap();
        assert_eq!(rec.name, "main");
        assert!(rec.loops.is_empty());
        assert!(rec.hints.is_none());
        assert!(rec.symbol_id.is_none());
        assert!(rec.calls[0].in_loop);
        assert!(rec.calls[0].target_symbol.is_none());
    }
}
