//! Analysis orchestration
//!
//! records → graph (frozen) → direct scores → propagation → dependency
//! metrics → classification → hotspots and summary.
//!
//! `analyze` is total: malformed, unresolved or cyclic input still yields a
//! result. Configuration is validated once, when the [`Analyzer`] is built.

use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cancellation::CancellationToken;
use crate::classifier::{derive_hotspots, Classifier, ExclusionChecker};
use crate::config::AnalysisConfig;
use crate::dependencies::{DependencyMetrics, DependencyResolver};
use crate::errors::{ConfigResult, PipelineError};
use crate::graph::{CallGraph, CallGraphQuery, FunctionNode, GraphBuilder, SymbolResolver};
use crate::models::{AnalysisResult, FunctionRecord, ScoreRecord, Severity, Summary};
use crate::pipeline::{ingest_files, IngestStats, PoolConfig};
use crate::propagation::select_strategy;
use crate::scoring::{default_table, CallWeights, DirectScore, DirectScorer};

pub struct Analyzer {
    config: AnalysisConfig,
    classifier: Classifier,
    weights: Arc<dyn CallWeights>,
    exclusion: Option<Arc<dyn ExclusionChecker>>,
    resolver: Option<Arc<dyn SymbolResolver>>,
    cancel: CancellationToken,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_valid(AnalysisConfig::default())
    }
}

impl Analyzer {
    /// Validate `config` and build an analyzer around it.
    pub fn new(config: AnalysisConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: AnalysisConfig) -> Self {
        Self {
            classifier: Classifier::from_config(&config),
            config,
            weights: Arc::new(default_table()),
            exclusion: None,
            resolver: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_weights(mut self, weights: Arc<dyn CallWeights>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_exclusion_checker(mut self, checker: Arc<dyn ExclusionChecker>) -> Self {
        self.exclusion = Some(checker);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SymbolResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A builder wired to this analyzer's symbol resolver
    pub fn graph_builder(&self) -> GraphBuilder {
        match &self.resolver {
            Some(r) => GraphBuilder::new().with_resolver(Arc::clone(r)),
            None => GraphBuilder::new(),
        }
    }

    pub fn analyze(&self, records: Vec<FunctionRecord>) -> AnalysisResult {
        let mut builder = self.graph_builder().with_capacity(records.len());
        builder.add_records(records);
        self.analyze_graph(&builder.build())
    }

    /// Ingest JSON record files on the worker pool, then analyze them.
    pub fn analyze_files(
        &self,
        paths: Vec<PathBuf>,
    ) -> Result<(AnalysisResult, IngestStats), PipelineError> {
        let pool = PoolConfig::for_input_count(paths.len(), self.config.effective_workers());
        let output = ingest_files(paths, &pool, &self.cancel)?;
        let stats = output.stats.clone();

        let mut builder = self.graph_builder().with_capacity(stats.records);
        output.merge_into(&mut builder);
        Ok((self.analyze_graph(&builder.build()), stats))
    }

    pub fn analyze_graph(&self, graph: &CallGraph) -> AnalysisResult {
        let n = graph.node_count();
        if n == 0 {
            info!("No functions to analyze");
            return AnalysisResult::default();
        }

        let scorer = DirectScorer::new(self.weights.as_ref());
        let direct: Vec<DirectScore> = (0..n)
            .into_par_iter()
            .map(|i| scorer.score(&graph.node(i).record))
            .collect();
        let direct_totals: Vec<f64> = direct.iter().map(DirectScore::total).collect();

        let strategy = select_strategy(&self.config.propagation, graph);
        let outcome = strategy.run(graph, &direct_totals, &self.cancel);
        let report = outcome.report(strategy.kind());
        info!(
            "Propagation ({}) finished after {} iterations, converged: {}",
            report.strategy, report.iterations, report.converged
        );

        let dependencies = DependencyResolver::new(graph)
            .with_max_depth(self.config.dependencies.max_depth)
            .resolve_all();

        let records: Vec<ScoreRecord> = (0..n)
            .map(|i| {
                self.score_record(
                    graph.node(i),
                    &direct[i],
                    outcome.propagated[i],
                    dependencies[i],
                )
            })
            .collect();

        let scores = self.classifier.classify(records);
        let hotspots = derive_hotspots(&scores);
        let summary = Summary::from_scores(&scores, &direct, graph.stats().dropped_calls);

        info!(
            "Analyzed {} functions: {} hotspots, {} excluded",
            summary.total_functions,
            hotspots.len(),
            summary.excluded
        );

        AnalysisResult {
            scores,
            summary,
            hotspots,
            propagation: report,
        }
    }

    fn is_excluded(&self, node: &FunctionNode) -> bool {
        node.hints().is_some_and(|h| h.exclude)
            || self
                .exclusion
                .as_ref()
                .is_some_and(|checker| checker.is_excluded(node))
    }

    fn score_record(
        &self,
        node: &FunctionNode,
        direct: &DirectScore,
        propagated: f64,
        dependencies: DependencyMetrics,
    ) -> ScoreRecord {
        let record = &node.record;
        let direct_score = direct.total();
        ScoreRecord {
            node_id: node.id,
            name: record.name.clone(),
            file_path: record.file_path.clone(),
            line: record.line_start,
            language: record.language.clone(),
            direct_score,
            propagated_score: propagated,
            total_score: direct_score + propagated,
            percentile: 0.0,
            severity: Severity::default(),
            is_excluded: self.is_excluded(node),
            is_test_file: false,
            loop_pressure: direct.loop_pressure,
            call_pressure: direct.call_pressure,
            call_frequency: node.call_frequency().cloned(),
            has_bounded_loops: node.loop_bound().is_some(),
            dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropagationMode;
    use crate::models::{CallDescriptor, Hints, LoopKind, StrategyKind};

    fn func(name: &str) -> FunctionRecord {
        FunctionRecord::new(name, "svc/app.go", "go")
    }

    #[test]
    fn test_empty_input() {
        let result = Analyzer::default().analyze(Vec::new());
        assert!(result.scores.is_empty());
        assert!(result.hotspots.is_empty());
        assert_eq!(result.summary.total_functions, 0);
    }

    #[test]
    fn test_colliding_fallback_names_both_scored() {
        let result = Analyzer::default().analyze(vec![
            func("Aa").calls_to("helper"),
            func("BB")
                .with_loop(LoopKind::For, 1)
                .with_call(CallDescriptor::new("make([]byte, 1024)").in_loop(1)),
        ]);
        assert_eq!(result.scores.len(), 2);
        assert_eq!(result.scores[0].name, "BB");
        assert!(result.score_of("Aa").is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            test_file_penalty: -1.0,
            ..Default::default()
        };
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn test_total_is_direct_plus_propagated() {
        let result = Analyzer::default().analyze(vec![
            func("main").calls_to("work"),
            func("work").with_call(CallDescriptor::new("make([]byte, 8)").in_loop(1)),
        ]);
        for s in &result.scores {
            assert!((s.total_score - (s.direct_score + s.propagated_score)).abs() < 1e-9);
        }
        assert_eq!(result.propagation.strategy, StrategyKind::NameIndexed);
        assert!(result.propagation.converged);
    }

    #[test]
    fn test_resolved_records_use_accumulation() {
        let result = Analyzer::default().analyze(vec![
            func("main").with_symbol(1).calls_to("work"),
            func("work")
                .with_symbol(2)
                .with_loop(LoopKind::For, 1)
                .with_call(CallDescriptor::new("make([]byte, 8)").in_loop(1)),
        ]);
        assert_eq!(result.propagation.strategy, StrategyKind::Resolved);
        let work = result.score_of("work").unwrap();
        let main = result.score_of("main").unwrap();
        assert!((work.direct_score - 10.5).abs() < 1e-9);
        assert!((main.propagated_score - 0.85 * 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_hint_exclusion_and_checker() {
        let excluded_by_hint = func("generated").with_hints(Hints {
            exclude: true,
            ..Default::default()
        });
        let analyzer = Analyzer::default().with_exclusion_checker(Arc::new(
            |node: &FunctionNode| node.name() == "vendored",
        ));
        let result = analyzer.analyze(vec![
            excluded_by_hint.calls_to("make([]int, 1)"),
            func("vendored").calls_to("make([]int, 1)"),
            func("kept").calls_to("make([]int, 1)"),
        ]);

        for name in ["generated", "vendored"] {
            let s = result.score_of(name).unwrap();
            assert!(s.is_excluded);
            assert_eq!(s.total_score, 0.0);
        }
        assert!(!result.score_of("kept").unwrap().is_excluded);
        assert_eq!(result.summary.excluded, 2);
    }

    #[test]
    fn test_forced_mode_from_config() {
        let config = AnalysisConfig::builder()
            .propagation_mode(PropagationMode::Resolved)
            .build()
            .unwrap();
        let result = Analyzer::new(config)
            .unwrap()
            .analyze(vec![func("a").calls_to("b"), func("b")]);
        assert_eq!(result.propagation.strategy, StrategyKind::Resolved);
        // Fallback ids contribute nothing to resolved accumulation
        assert!(result.scores.iter().all(|s| s.propagated_score == 0.0));
    }

    #[test]
    fn test_bounded_hint_marks_record() {
        let result = Analyzer::default().analyze(vec![func("retry")
            .with_hints(Hints {
                loop_bounded: Some(3),
                ..Default::default()
            })
            .with_call(CallDescriptor::new("make([]byte, 1)").in_loop(1))]);
        let s = result.score_of("retry").unwrap();
        assert!(s.has_bounded_loops);
        // 1.0 × 3 + 0.5
        assert!((s.direct_score - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_analysis_still_returns() {
        let token = CancellationToken::new();
        token.cancel();
        let result = Analyzer::default()
            .with_cancellation(token)
            .analyze(vec![func("a").calls_to("b"), func("b")]);
        assert_eq!(result.scores.len(), 2);
        assert!(result.propagation.cancelled);
    }
}
