//! Call graph model
//!
//! Pure Rust implementation on petgraph, with a single-writer build phase
//! and a frozen read-only snapshot for analysis.

pub mod node_id;
pub mod store;
pub mod traits;

pub use node_id::{name_hash, NodeId};
pub use store::{BuildStats, CallEdge, CallGraph, EdgeResolution, FunctionNode, GraphBuilder};
pub use traits::{CallGraphQuery, SymbolResolver};
