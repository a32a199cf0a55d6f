//! Pressure - call-graph metric propagation
//!
//! Scores every function in a call graph by the allocation pressure it
//! causes directly and the pressure it inherits from the functions it calls,
//! then ranks the population into severity tiers and explains the hotspots.
//!
//! ```no_run
//! use pressure::{Analyzer, CallDescriptor, FunctionRecord};
//!
//! let records = vec![
//!     FunctionRecord::new("main", "main.go", "go").calls_to("encode"),
//!     FunctionRecord::new("encode", "codec.go", "go")
//!         .with_call(CallDescriptor::new("json.Marshal(v)").in_loop(1)),
//! ];
//! let result = Analyzer::default().analyze(records);
//! for hotspot in &result.hotspots {
//!     println!("{} {}: {}", hotspot.severity, hotspot.name, hotspot.reason);
//! }
//! ```

pub mod cancellation;
pub mod classifier;
pub mod config;
pub mod dependencies;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod models;
pub mod pipeline;
pub mod propagation;
pub mod scoring;

pub use cancellation::CancellationToken;
pub use classifier::{Classifier, ExclusionChecker};
pub use config::{load_config, load_config_file, AnalysisConfig, PropagationMode};
pub use dependencies::{DependencyMetrics, DependencyResolver};
pub use engine::Analyzer;
pub use errors::{ConfigError, PipelineError};
pub use graph::{CallGraph, CallGraphQuery, FunctionNode, GraphBuilder, NodeId, SymbolResolver};
pub use models::{
    AnalysisResult, CallDescriptor, CallFrequency, FunctionRecord, Hints, Hotspot,
    HotspotReason, LoopDescriptor, LoopKind, PropagationReport, ScoreRecord, Severity,
    StrategyKind, Summary,
};
pub use propagation::{select_strategy, PropagationStrategy};
pub use scoring::{CallWeights, WeightTable};
