use super::*;
use crate::graph::CallGraphQuery;
use crate::models::{FunctionRecord, Hints};

fn func(name: &str) -> FunctionRecord {
    FunctionRecord::new(name, "test.go", "go")
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn direct_by_name(graph: &CallGraph, values: &[(&str, f64)]) -> Vec<f64> {
    let mut direct = vec![0.0; graph.node_count()];
    for (name, v) in values {
        direct[graph.index_by_name(name).unwrap()] = *v;
    }
    direct
}

fn resolved_chain(b_hints: Option<Hints>) -> CallGraph {
    let mut b = func("b").with_symbol(2).calls_to("c");
    b.hints = b_hints;
    CallGraph::from_records(vec![
        func("a").with_symbol(1).calls_to("b"),
        b,
        func("c").with_symbol(3),
    ])
}

#[test]
fn test_resolved_chain_accumulates() {
    let graph = resolved_chain(None);
    let direct = direct_by_name(&graph, &[("c", 10.0)]);
    let out = ResolvedAccumulation::default().run(&graph, &direct, &CancellationToken::new());

    assert!(out.converged);
    assert_eq!(out.iterations, 3);
    assert!(approx(out.propagated[graph.index_by_name("c").unwrap()], 0.0));
    assert!(approx(out.propagated[graph.index_by_name("b").unwrap()], 8.5));
    assert!(approx(out.propagated[graph.index_by_name("a").unwrap()], 7.225));
}

#[test]
fn test_resolved_propagation_weight_override() {
    let hints = Hints {
        propagation_weight: Some(0.5),
        ..Default::default()
    };
    let graph = resolved_chain(Some(hints));
    let direct = direct_by_name(&graph, &[("c", 10.0)]);
    let out = ResolvedAccumulation::default().run(&graph, &direct, &CancellationToken::new());
    assert!(approx(out.propagated[graph.index_by_name("b").unwrap()], 5.0));
}

#[test]
fn test_resolved_bounded_loop_scales_damping() {
    let hints = Hints {
        loop_bounded: Some(2),
        ..Default::default()
    };
    let graph = resolved_chain(Some(hints));
    let b = graph.node(graph.index_by_name("b").unwrap());
    assert!(approx(ResolvedAccumulation::default().damping_for(b), 0.85 * 0.2));

    // Bounds at or past the reference keep full damping
    let hints = Hints {
        loop_bounded: Some(40),
        ..Default::default()
    };
    let graph = resolved_chain(Some(hints));
    let b = graph.node(graph.index_by_name("b").unwrap());
    assert!(approx(ResolvedAccumulation::default().damping_for(b), 0.85));
}

#[test]
fn test_resolved_runaway_cycle_hits_cap_finite() {
    // Gain 1.7 per round: never converges, must stop at the cap
    let graph = CallGraph::from_records(vec![func("a").with_symbol(1).calls_to("a").calls_to("a")]);
    let out = ResolvedAccumulation::default().run(&graph, &[1.0], &CancellationToken::new());
    assert!(!out.converged);
    assert_eq!(out.iterations, 20);
    assert!(out.propagated[0].is_finite());
    assert!(out.propagated[0] > 0.0);
}

#[test]
fn test_resolved_skips_fallback_callees() {
    let graph = CallGraph::from_records(vec![func("a").with_symbol(1).calls_to("b"), func("b")]);
    let direct = direct_by_name(&graph, &[("b", 4.0)]);
    let out = ResolvedAccumulation::default().run(&graph, &direct, &CancellationToken::new());
    assert!(approx(out.propagated[graph.index_by_name("a").unwrap()], 0.0));
}

#[test]
fn test_name_indexed_diamond_symmetric() {
    let graph = CallGraph::from_records(vec![
        func("a").calls_to("b").calls_to("c"),
        func("b").calls_to("d"),
        func("c").calls_to("d"),
        func("d"),
    ]);
    let direct = direct_by_name(&graph, &[("d", 30.0), ("a", 0.2), ("b", 0.1), ("c", 0.1)]);
    let out = NameIndexedRank::default().run(&graph, &direct, &CancellationToken::new());

    assert!(out.converged);
    let b = out.propagated[graph.index_by_name("b").unwrap()];
    let c = out.propagated[graph.index_by_name("c").unwrap()];
    assert!(b > 0.0);
    assert!(approx(b, c));
}

#[test]
fn test_name_indexed_chain_fixed_point() {
    let graph = CallGraph::from_records(vec![
        func("main").calls_to("process"),
        func("process").calls_to("allocate"),
        func("allocate"),
    ]);
    let direct = direct_by_name(&graph, &[("allocate", 16.0), ("main", 0.1), ("process", 0.1)]);
    let out = NameIndexedRank::default().run(&graph, &direct, &CancellationToken::new());

    let base = 0.15 / 3.0;
    let alloc = base;
    let process = base + 0.85 * alloc;
    let main = base + 0.85 * process;
    assert!(out.converged);
    assert!(approx(out.propagated[graph.index_by_name("allocate").unwrap()], alloc * 100.0));
    assert!(approx(out.propagated[graph.index_by_name("process").unwrap()], process * 100.0));
    assert!(approx(out.propagated[graph.index_by_name("main").unwrap()], main * 100.0));
}

#[test]
fn test_name_indexed_cycle_terminates() {
    let graph = CallGraph::from_records(vec![
        func("a").calls_to("b"),
        func("b").calls_to("c"),
        func("c").calls_to("a"),
    ]);
    let direct = direct_by_name(&graph, &[("c", 10.5)]);
    let out = NameIndexedRank::default().run(&graph, &direct, &CancellationToken::new());
    assert!(out.iterations <= 100);
    assert!(out.propagated.iter().all(|v| v.is_finite()));
}

#[test]
fn test_name_indexed_empty_graph() {
    let graph = CallGraph::from_records(Vec::new());
    let out = NameIndexedRank::default().run(&graph, &[], &CancellationToken::new());
    assert!(out.propagated.is_empty());
    assert!(out.converged);
}

#[test]
fn test_cancelled_before_start() {
    let graph = CallGraph::from_records(vec![func("a").calls_to("b"), func("b")]);
    let direct = direct_by_name(&graph, &[("b", 5.0)]);
    let token = CancellationToken::new();
    token.cancel();

    let strategies: Vec<Box<dyn PropagationStrategy>> = vec![
        Box::new(NameIndexedRank::default()),
        Box::new(ResolvedAccumulation::default()),
    ];
    for strategy in strategies {
        let out = strategy.run(&graph, &direct, &token);
        assert!(out.cancelled);
        assert!(!out.converged);
        assert_eq!(out.iterations, 0);
        assert!(out.propagated.iter().all(|v| *v == 0.0));
    }
}

#[test]
fn test_select_strategy() {
    let config = PropagationConfig::default();
    let resolved = CallGraph::from_records(vec![func("a").with_symbol(1)]);
    let partial = CallGraph::from_records(vec![func("a").with_symbol(1), func("b")]);

    assert_eq!(select_strategy(&config, &resolved).kind(), StrategyKind::Resolved);
    assert_eq!(select_strategy(&config, &partial).kind(), StrategyKind::NameIndexed);

    let forced = PropagationConfig {
        mode: PropagationMode::Resolved,
        ..Default::default()
    };
    assert_eq!(select_strategy(&forced, &partial).kind(), StrategyKind::Resolved);
}

#[test]
fn test_report_carries_flags() {
    let out = PropagationOutcome {
        propagated: vec![],
        iterations: 7,
        converged: true,
        cancelled: false,
    };
    let report = out.report(StrategyKind::NameIndexed);
    assert_eq!(report.iterations, 7);
    assert!(report.converged);
    assert_eq!(report.strategy, StrategyKind::NameIndexed);
}
