use super::*;
use crate::models::CallDescriptor;

fn func(name: &str) -> FunctionRecord {
    FunctionRecord::new(name, "test.go", "go")
}

struct TableResolver(Vec<(&'static str, u64)>);

impl SymbolResolver for TableResolver {
    fn resolve_function(&self, record: &FunctionRecord) -> Option<u64> {
        self.0
            .iter()
            .find(|(n, _)| *n == record.name)
            .map(|(_, s)| *s)
    }

    fn resolve_call(&self, _caller: &FunctionRecord, call: &CallDescriptor) -> Option<u64> {
        self.0
            .iter()
            .find(|(n, _)| *n == call.target)
            .map(|(_, s)| *s)
    }
}

#[test]
fn test_name_matched_edges() {
    let graph = CallGraph::from_records(vec![
        func("a").calls_to("b"),
        func("b").calls_to("c"),
        func("c"),
    ]);

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    let a = graph.index_by_name("a").unwrap();
    let b = graph.index_by_name("b").unwrap();
    assert_eq!(graph.callees(a), &[b]);
    assert_eq!(graph.callers(b), &[a]);
    assert_eq!(graph.fan_in(a), 0);
    assert_eq!(graph.fan_out(a), 1);
    assert!(!graph.is_fully_resolved());
    assert!(graph.call_edges(a).all(|(_, e)| e.resolution == EdgeResolution::Name));
}

#[test]
fn test_unresolved_calls_dropped() {
    let graph = CallGraph::from_records(vec![func("a")
        .calls_to("fmt.Println")
        .calls_to("make([]byte, 10)")
        .calls_to("b")]);

    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.stats().dropped_calls, 3);
}

#[test]
fn test_parallel_edges_kept() {
    let graph = CallGraph::from_records(vec![func("a").calls_to("b").calls_to("b"), func("b")]);

    let a = graph.index_by_name("a").unwrap();
    let b = graph.index_by_name("b").unwrap();
    assert_eq!(graph.callees(a), &[b, b]);
    assert_eq!(graph.fan_in(b), 2);
}

#[test]
fn test_cycles_and_self_calls() {
    let graph = CallGraph::from_records(vec![
        func("a").calls_to("a").calls_to("b"),
        func("b").calls_to("a"),
    ]);
    let a = graph.index_by_name("a").unwrap();
    assert_eq!(graph.fan_in(a), 2);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_duplicate_ids_keep_first() {
    let mut builder = GraphBuilder::new();
    assert!(builder.add_record(func("dup").with_lines(1, 2)).is_some());
    assert!(builder.add_record(func("dup").with_lines(5, 9)).is_none());
    let graph = builder.build();

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.node(0).record.line_start, 1);
    assert_eq!(graph.stats().duplicate_ids, 1);
}

#[test]
fn test_fallback_hash_collision_keeps_both() {
    assert_eq!(NodeId::fallback("Aa"), NodeId::fallback("BB"));

    let graph = CallGraph::from_records(vec![
        func("Aa").calls_to("BB"),
        func("BB").calls_to("make([]byte, 1024)"),
        func("Aa"),
    ]);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.stats().hash_collisions, 1);
    assert_eq!(graph.stats().duplicate_ids, 1);

    let aa = graph.index_by_name("Aa").unwrap();
    let bb = graph.index_by_name("BB").unwrap();
    assert_eq!(graph.callees(aa), &[bb]);
    assert_eq!(graph.node(bb).id, graph.node(aa).id);
}

#[test]
fn test_unnamed_without_symbol_rejected() {
    let mut builder = GraphBuilder::new();
    assert!(builder.add_record(func("")).is_none());
    // A resolved symbol is enough identity on its own
    assert!(builder.add_record(func("").with_symbol(9)).is_some());
    let graph = builder.build();
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.stats().rejected, 1);
}

#[test]
fn test_symbol_edges_take_precedence() {
    let graph = CallGraph::from_records(vec![
        func("caller")
            .with_symbol(1)
            .with_call(CallDescriptor::new("helper").with_target_symbol(3)),
        func("helper").with_symbol(2),
        func("other_helper").with_symbol(3),
    ]);

    let caller = graph.index_of(NodeId::Resolved(1)).unwrap();
    let target = graph.index_of(NodeId::Resolved(3)).unwrap();
    assert_eq!(graph.callees(caller), &[target]);
    assert!(graph.is_fully_resolved());
    let (_, edge) = graph.call_edges(caller).next().unwrap();
    assert_eq!(edge.resolution, EdgeResolution::Symbol);
}

#[test]
fn test_resolver_fills_missing_symbols() {
    let resolver = Arc::new(TableResolver(vec![("a", 10), ("b", 11)]));
    let mut builder = GraphBuilder::new().with_resolver(resolver);
    builder.add_records(vec![func("a").calls_to("b"), func("b")]);
    let graph = builder.build();

    assert!(graph.is_fully_resolved());
    let a = graph.index_of(NodeId::Resolved(10)).unwrap();
    let (callee, edge) = graph.call_edges(a).next().unwrap();
    assert_eq!(graph.node(callee).id, NodeId::Resolved(11));
    assert_eq!(edge.resolution, EdgeResolution::Symbol);
}

#[test]
fn test_mixed_regimes_not_fully_resolved() {
    let graph = CallGraph::from_records(vec![func("a").with_symbol(1), func("b")]);
    assert!(!graph.is_fully_resolved());
    assert!(graph.is_resolved(0));
    assert!(!graph.is_resolved(1));
    assert_eq!(graph.node(1).id, NodeId::fallback("b"));
}

#[test]
fn test_empty_graph() {
    let graph = GraphBuilder::new().build();
    assert!(graph.is_empty());
    assert!(!graph.is_fully_resolved());
    assert_eq!(graph.stats(), &BuildStats::default());
}
