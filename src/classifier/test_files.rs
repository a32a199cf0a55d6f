//! Test, fixture and benchmark file detection
//!
//! Four rule sets, OR'd together: filename suffix by extension, filename
//! prefix by extension, directory substrings, and an optional custom predicate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub type TestFilePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestFilePatterns {
    /// Extension (with dot) -> filename-stem suffixes
    pub suffixes: HashMap<String, Vec<String>>,
    /// Extension (with dot) -> filename-stem prefixes
    pub prefixes: HashMap<String, Vec<String>>,
    /// Substrings matched against `"/" + normalized path`
    pub directories: Vec<String>,
    /// Extra rule supplied in code; sees the path as given
    #[serde(skip)]
    pub custom: Option<TestFilePredicate>,
}

impl std::fmt::Debug for TestFilePatterns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestFilePatterns")
            .field("suffixes", &self.suffixes)
            .field("prefixes", &self.prefixes)
            .field("directories", &self.directories)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for TestFilePatterns {
    fn default() -> Self {
        let js_like = [".test", ".spec", "_test", "_spec"];
        let mut suffixes = HashMap::new();
        suffixes.insert(".go".to_string(), owned(&["_test"]));
        for ext in [".js", ".jsx", ".ts", ".tsx", ".mjs", ".mts"] {
            suffixes.insert(ext.to_string(), owned(&js_like));
        }
        suffixes.insert(".py".to_string(), owned(&["_test"]));
        suffixes.insert(".java".to_string(), owned(&["test", "tests", "it"]));
        suffixes.insert(".cs".to_string(), owned(&["test", "tests"]));
        suffixes.insert(".rs".to_string(), owned(&["_test"]));
        suffixes.insert(".rb".to_string(), owned(&["_test", "_spec"]));
        suffixes.insert(".php".to_string(), owned(&["test"]));

        let mut prefixes = HashMap::new();
        prefixes.insert(".py".to_string(), owned(&["test_"]));

        let directories = owned(&[
            "/tests/",
            "/test/",
            "/__tests__/",
            "/spec/",
            "/specs/",
            "/fixtures/",
            "/testdata/",
            "/testutil/",
            "/testing/",
            "/internal/testing/",
            "/mocks/",
            "/mock/",
            "/stubs/",
            "/fakes/",
            "/benchmarks/",
            "/bench/",
        ]);

        Self {
            suffixes,
            prefixes,
            directories,
            custom: None,
        }
    }
}

impl TestFilePatterns {
    /// No rules at all; nothing is a test file.
    pub fn none() -> Self {
        Self {
            suffixes: HashMap::new(),
            prefixes: HashMap::new(),
            directories: Vec::new(),
            custom: None,
        }
    }

    pub fn with_custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(predicate));
        self
    }

    pub fn with_directory(mut self, dir: &str) -> Self {
        self.directories.push(dir.to_string());
        self
    }

    pub fn with_suffix(mut self, ext: &str, suffix: &str) -> Self {
        self.suffixes
            .entry(ext.to_string())
            .or_default()
            .push(suffix.to_string());
        self
    }

    pub fn with_prefix(mut self, ext: &str, prefix: &str) -> Self {
        self.prefixes
            .entry(ext.to_string())
            .or_default()
            .push(prefix.to_string());
        self
    }

    pub fn is_test_file(&self, file_path: &str) -> bool {
        let normalized = file_path.replace('\\', "/").to_lowercase();

        let rooted = format!("/{normalized}");
        if self.directories.iter().any(|d| rooted.contains(d.as_str())) {
            return true;
        }

        let base = normalized.rsplit('/').next().unwrap_or(&normalized);
        let ext = Path::new(base)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let stem = base.strip_suffix(ext.as_str()).unwrap_or(base);

        if let Some(suffixes) = self.suffixes.get(&ext) {
            if suffixes.iter().any(|s| stem.ends_with(s.as_str())) {
                return true;
            }
        }
        if let Some(prefixes) = self.prefixes.get(&ext) {
            if prefixes.iter().any(|p| stem.starts_with(p.as_str())) {
                return true;
            }
        }

        self.custom.as_ref().is_some_and(|f| f(file_path))
    }
}
