//! Analysis configuration
//!
//! Loaded from `pressure.toml` in the project root, or assembled in code
//! through [`AnalysisConfigBuilder`]. Either way the values are validated
//! before an analysis run starts; this is the only place analysis can fail.
//!
//! # Configuration Format
//!
//! ```toml
//! # pressure.toml
//! include_test_files = false
//! test_file_penalty = 0.1
//! workers = 8
//!
//! [test_file_patterns]
//! directories = ["/tests/", "/fixtures/"]
//! suffixes = { ".go" = ["_test"] }
//!
//! [propagation]
//! mode = "auto"          # auto | resolved | name_indexed
//! damping = 0.85
//!
//! [dependencies]
//! max_depth = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::classifier::test_files::TestFilePatterns;
use crate::errors::{ConfigError, ConfigResult};

pub const CONFIG_FILE_NAME: &str = "pressure.toml";

/// Upper bound for the ingest worker pool
pub const MAX_WORKERS: usize = 64;

/// Which propagation strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Resolved accumulation when every node has a resolved symbol,
    /// name-indexed ranking otherwise
    #[default]
    Auto,
    Resolved,
    NameIndexed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropagationConfig {
    pub mode: PropagationMode,
    /// Default damping for resolved accumulation; hints may override per node
    pub damping: f64,
    pub resolved_max_iterations: usize,
    pub resolved_threshold: f64,
    pub fallback_damping: f64,
    pub fallback_max_iterations: usize,
    pub fallback_threshold: f64,
    /// Factor bringing name-indexed scores into the resolved range
    pub fallback_scale: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            mode: PropagationMode::Auto,
            damping: 0.85,
            resolved_max_iterations: 20,
            resolved_threshold: 0.001,
            fallback_damping: 0.85,
            fallback_max_iterations: 100,
            fallback_threshold: 0.0001,
            fallback_scale: 100.0,
        }
    }
}

impl PropagationConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_damping("resolved", self.damping)?;
        check_damping("fallback", self.fallback_damping)?;
        if self.resolved_max_iterations == 0 {
            return Err(ConfigError::ZeroIterations("resolved"));
        }
        if self.fallback_max_iterations == 0 {
            return Err(ConfigError::ZeroIterations("fallback"));
        }
        check_threshold("resolved", self.resolved_threshold)?;
        check_threshold("fallback", self.fallback_threshold)?;
        if !self.fallback_scale.is_finite() || self.fallback_scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.fallback_scale));
        }
        Ok(())
    }
}

fn check_damping(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDamping { name, value })
    }
}

fn check_threshold(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DependencyConfig {
    /// Recursion depth cap for transitive and cycle traversals
    pub max_depth: usize,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self { max_depth: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Score test files at full weight instead of applying the penalty
    pub include_test_files: bool,
    pub test_file_penalty: f64,
    pub test_file_patterns: TestFilePatterns,
    pub propagation: PropagationConfig,
    pub dependencies: DependencyConfig,
    /// Ingest worker count (0 = available parallelism)
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_test_files: false,
            test_file_penalty: 0.1,
            test_file_patterns: TestFilePatterns::default(),
            propagation: PropagationConfig::default(),
            dependencies: DependencyConfig::default(),
            workers: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let p = self.test_file_penalty;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::PenaltyOutOfRange(p));
        }
        self.propagation.validate()?;
        if self.dependencies.max_depth == 0 {
            return Err(ConfigError::ZeroDepthCap);
        }
        if self.workers > MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers {
                max: MAX_WORKERS,
                got: self.workers,
            });
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the machine's parallelism
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(16)
    }
}

/// Fluent construction with validation at [`build`](AnalysisConfigBuilder::build)
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn from_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn include_test_files(mut self, include: bool) -> Self {
        self.config.include_test_files = include;
        self
    }

    pub fn test_file_penalty(mut self, penalty: f64) -> Self {
        self.config.test_file_penalty = penalty;
        self
    }

    pub fn test_file_patterns(mut self, patterns: TestFilePatterns) -> Self {
        self.config.test_file_patterns = patterns;
        self
    }

    /// Add a custom test-file rule on top of the current patterns
    pub fn test_file_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.config.test_file_patterns = self.config.test_file_patterns.with_custom(predicate);
        self
    }

    pub fn propagation_mode(mut self, mode: PropagationMode) -> Self {
        self.config.propagation.mode = mode;
        self
    }

    pub fn damping(mut self, damping: f64) -> Self {
        self.config.propagation.damping = damping;
        self
    }

    pub fn propagation(mut self, propagation: PropagationConfig) -> Self {
        self.config.propagation = propagation;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.dependencies.max_depth = depth;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn build(self) -> ConfigResult<AnalysisConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Load and validate a config file.
pub fn load_config_file(path: &Path) -> ConfigResult<AnalysisConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AnalysisConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `pressure.toml` from `dir`, falling back to defaults when absent or unusable.
pub fn load_config(dir: &Path) -> AnalysisConfig {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
        return AnalysisConfig::default();
    }
    match load_config_file(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            AnalysisConfig::default()
        }
    }
}
