//! Language-keyed allocation weight tables
//!
//! Each language maps to an ordered list of patterns; the first pattern that
//! matches a call target decides its weight. Unmatched calls get
//! [`BASE_CALL_WEIGHT`], never zero.

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Weight of a call no pattern recognizes
pub const BASE_CALL_WEIGHT: f64 = 0.1;

/// Language used when the record's language has no table
pub const FALLBACK_LANGUAGE: &str = "javascript";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationCategory {
    Heap,
    GcManaged,
}

#[derive(Debug, Clone)]
pub struct AllocationPattern {
    pub pattern: Regex,
    pub category: AllocationCategory,
    pub weight: f64,
    pub description: &'static str,
}

impl AllocationPattern {
    pub fn new(
        pattern: Regex,
        category: AllocationCategory,
        weight: f64,
        description: &'static str,
    ) -> Self {
        Self {
            pattern,
            category,
            weight,
            description,
        }
    }
}

/// Assigns a relative cost to a call target.
pub trait CallWeights: Send + Sync {
    fn weight(&self, language: &str, target: &str) -> f64;
}

impl<T: CallWeights + ?Sized> CallWeights for &T {
    fn weight(&self, language: &str, target: &str) -> f64 {
        (**self).weight(language, target)
    }
}

/// Pattern tables keyed by language
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    languages: FxHashMap<String, Vec<AllocationPattern>>,
}

impl WeightTable {
    /// A table with no languages; every call scores [`BASE_CALL_WEIGHT`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace or add the table for one language.
    pub fn with_language(mut self, language: &str, patterns: Vec<AllocationPattern>) -> Self {
        self.languages.insert(normalize_language(language), patterns);
        self
    }

    pub fn patterns_for(&self, language: &str) -> Option<&[AllocationPattern]> {
        self.languages
            .get(&normalize_language(language))
            .or_else(|| self.languages.get(FALLBACK_LANGUAGE))
            .map(Vec::as_slice)
    }

    /// First matching pattern for a call target
    pub fn classify(&self, language: &str, target: &str) -> Option<&AllocationPattern> {
        self.patterns_for(language)?
            .iter()
            .find(|p| p.pattern.is_match(target))
    }
}

impl CallWeights for WeightTable {
    fn weight(&self, language: &str, target: &str) -> f64 {
        self.classify(language, target)
            .map(|p| p.weight)
            .unwrap_or(BASE_CALL_WEIGHT)
    }
}

/// Canonical table key: lowercase with common short names expanded.
pub fn normalize_language(language: &str) -> String {
    let lower = language.trim().to_ascii_lowercase();
    match lower.as_str() {
        "js" | "jsx" | "mjs" => "javascript".to_string(),
        "ts" | "tsx" | "mts" => "typescript".to_string(),
        "py" => "python".to_string(),
        "rs" => "rust".to_string(),
        "golang" => "go".to_string(),
        "c#" | "cs" | "c_sharp" => "csharp".to_string(),
        _ => lower,
    }
}

static DEFAULT_TABLE: OnceLock<WeightTable> = OnceLock::new();

/// Built-in tables for go, javascript, typescript, python, rust, java and csharp.
pub fn default_table() -> &'static WeightTable {
    DEFAULT_TABLE.get_or_init(build_default_table)
}

fn pat(
    re: &str,
    category: AllocationCategory,
    weight: f64,
    description: &'static str,
) -> AllocationPattern {
    AllocationPattern::new(
        Regex::new(re).expect("valid allocation regex"),
        category,
        weight,
        description,
    )
}

fn build_default_table() -> WeightTable {
    use AllocationCategory::{GcManaged, Heap};

    let go = vec![
        pat(r"make\s*\(", Heap, 1.0, "make() allocates on heap"),
        pat(r"new\s*\(", Heap, 1.0, "new() allocates on heap"),
        pat(r"&\w+\{", Heap, 0.8, "composite literal address may escape"),
        pat(r"append\s*\(", Heap, 0.5, "append may reallocate"),
        pat(r"\[\]byte\s*\(", Heap, 0.7, "byte slice conversion"),
        pat(r"string\s*\(", Heap, 0.7, "string conversion"),
        pat(r"fmt\.Sprintf", Heap, 0.8, "Sprintf builds a string"),
        pat(r"json\.(Marshal|Unmarshal)", Heap, 1.5, "JSON serialization"),
        pat(r"regexp\.(Compile|MustCompile)", Heap, 2.0, "regex compilation"),
    ];

    let javascript = vec![
        pat(r"new\s+\w+", GcManaged, 1.0, "new creates an object"),
        pat(r"\{\s*\}", GcManaged, 0.3, "object literal"),
        pat(r"\[\s*\]", GcManaged, 0.3, "array literal"),
        pat(r"Array\s*\(", GcManaged, 0.5, "array constructor"),
        pat(
            r"Object\.(create|assign|keys|values|entries)",
            GcManaged,
            0.5,
            "Object helpers build new objects",
        ),
        pat(r"\.map\s*\(", GcManaged, 0.8, "map builds an array"),
        pat(r"\.filter\s*\(", GcManaged, 0.6, "filter builds an array"),
        pat(r"\.slice\s*\(", GcManaged, 0.5, "slice copies"),
        pat(r"\.concat\s*\(", GcManaged, 0.7, "concat builds an array"),
        pat(r"JSON\.(parse|stringify)", GcManaged, 1.2, "JSON operations"),
        pat(r"new\s+RegExp", GcManaged, 1.5, "regex construction"),
        pat(r"\.split\s*\(", GcManaged, 0.8, "split builds an array"),
    ];

    let python = vec![
        pat(r"\[\s*\]", GcManaged, 0.3, "list literal"),
        pat(r"\{\s*\}", GcManaged, 0.3, "dict literal"),
        pat(r"\(\s*\)", GcManaged, 0.2, "tuple literal"),
        pat(r"list\s*\(", GcManaged, 0.5, "list() builds a list"),
        pat(r"dict\s*\(", GcManaged, 0.5, "dict() builds a dict"),
        pat(r"set\s*\(", GcManaged, 0.5, "set() builds a set"),
        pat(r"\w+\s*\(", GcManaged, 0.4, "call may return a new object"),
        pat(r"copy\.(copy|deepcopy)", GcManaged, 1.5, "object copy"),
        pat(r"json\.(loads|dumps)", GcManaged, 1.2, "JSON operations"),
        pat(r"re\.(compile|match|search)", GcManaged, 1.0, "regex operations"),
    ];

    let rust = vec![
        pat(r"Box::new", Heap, 1.0, "Box allocates"),
        pat(r"Vec::new|vec!\[", Heap, 0.8, "Vec allocates"),
        pat(
            r"String::new|String::from|\.to_string\(\)",
            Heap,
            0.7,
            "String allocates",
        ),
        pat(r"Rc::new", Heap, 1.0, "Rc allocates with a refcount"),
        pat(r"Arc::new", Heap, 1.2, "Arc allocates with an atomic refcount"),
        pat(r"HashMap::new|HashSet::new", Heap, 1.0, "hash collections allocate"),
        pat(r"\.clone\(\)", Heap, 0.8, "clone may allocate"),
        pat(r"\.to_vec\(\)", Heap, 0.8, "to_vec allocates"),
        pat(r"\.collect\(\)", Heap, 0.6, "collect allocates"),
    ];

    let java = vec![
        pat(r"new\s+\w+", Heap, 1.0, "new allocates an object"),
        pat(r"Arrays\.copyOf", Heap, 0.8, "array copy"),
        pat(r"\.clone\(\)", Heap, 0.8, "clone allocates"),
        pat(r"StringBuilder|StringBuffer", Heap, 0.6, "string builder"),
        pat(
            r"new\s+ArrayList|new\s+HashMap|new\s+HashSet",
            Heap,
            1.0,
            "collection creation",
        ),
        pat(r"\.stream\(\).*\.collect\(", Heap, 1.2, "stream collection"),
        pat(r"String\.format", Heap, 0.7, "string formatting"),
        pat(r"Pattern\.compile", Heap, 1.5, "regex compilation"),
    ];

    let csharp = vec![
        pat(r"new\s+\w+", Heap, 1.0, "new allocates an object"),
        pat(r"\.ToArray\(\)", Heap, 0.8, "ToArray allocates"),
        pat(r"\.ToList\(\)", Heap, 0.8, "ToList allocates"),
        pat(r"string\.Format", Heap, 0.7, "string formatting"),
        pat(r#"\$""#, Heap, 0.6, "string interpolation"),
        pat(
            r"new\s+List<|new\s+Dictionary<",
            Heap,
            1.0,
            "collection creation",
        ),
        pat(r"\.Select\(.*\)\.ToList\(", Heap, 1.2, "LINQ materialization"),
        pat(r"Regex\.Match|new\s+Regex", Heap, 1.5, "regex operations"),
    ];

    WeightTable::empty()
        .with_language("go", go)
        .with_language("typescript", javascript.clone())
        .with_language("javascript", javascript)
        .with_language("python", python)
        .with_language("rust", rust)
        .with_language("java", java)
        .with_language("csharp", csharp)
}
