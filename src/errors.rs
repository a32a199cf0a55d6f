//! Error types
//!
//! Analysis itself never fails. Invalid configuration is rejected before a
//! run starts, and file ingest can fail on unreadable input.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("test file penalty must be within [0, 1], got {0}")]
    PenaltyOutOfRange(f64),

    #[error("{name} damping must be within (0, 1), got {value}")]
    InvalidDamping { name: &'static str, value: f64 },

    #[error("{0} iteration cap must be at least 1")]
    ZeroIterations(&'static str),

    #[error("{name} convergence threshold must be positive and finite, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("fallback scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    #[error("dependency depth cap must be at least 1")]
    ZeroDepthCap,

    #[error("workers cannot exceed {max}, got {got}")]
    TooManyWorkers { max: usize, got: usize },

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode records in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ingest worker panicked")]
    WorkerPanicked,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
