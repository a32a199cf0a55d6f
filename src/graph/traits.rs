//! Graph seams used by propagation, dependency resolution and the builder

use crate::models::{CallDescriptor, FunctionRecord};

/// Read-only adjacency view over a frozen call graph.
///
/// Nodes are addressed by dense index `0..node_count()`. Parallel edges are
/// kept, so a function calling `b` twice lists `b` twice.
pub trait CallGraphQuery: Send + Sync {
    fn node_count(&self) -> usize;

    /// Functions this node calls
    fn callees(&self, idx: usize) -> &[usize];

    /// Functions that call this node
    fn callers(&self, idx: usize) -> &[usize];

    /// Count of callers (fan-in)
    fn fan_in(&self, idx: usize) -> usize {
        self.callers(idx).len()
    }

    /// Count of callees (fan-out)
    fn fan_out(&self, idx: usize) -> usize {
        self.callees(idx).len()
    }

    /// Whether the node is identified by a resolved symbol
    fn is_resolved(&self, idx: usize) -> bool;
}

/// Resolves functions and call targets to symbol identifiers.
///
/// Consulted by the graph builder only for records and calls that arrive
/// without a symbol. Returning `None` leaves the fallback regime in place.
pub trait SymbolResolver: Send + Sync {
    /// Symbol of the function itself, looked up by file and name
    fn resolve_function(&self, record: &FunctionRecord) -> Option<u64>;

    /// Symbol of a call's target as seen from `caller`
    fn resolve_call(&self, caller: &FunctionRecord, call: &CallDescriptor) -> Option<u64> {
        let _ = (caller, call);
        None
    }
}
