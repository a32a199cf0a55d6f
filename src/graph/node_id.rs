//! Node identity
//!
//! A node is either tied to a resolved symbol or to a hash of its
//! fully-qualified name. The two spaces carry different guarantees and are
//! never compared across: `Resolved(7)` and `Fallback(7)` are different nodes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeId {
    /// Globally unique symbol identifier from a resolver
    Resolved(u64),
    /// Deterministic hash of the fully-qualified name. Collisions are possible.
    Fallback(u64),
}

impl NodeId {
    pub fn resolved(symbol: u64) -> Self {
        NodeId::Resolved(symbol)
    }

    /// Derive an identifier from a fully-qualified name.
    pub fn fallback(qualified_name: &str) -> Self {
        NodeId::Fallback(name_hash(qualified_name))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, NodeId::Resolved(_))
    }

    pub fn raw(&self) -> u64 {
        match self {
            NodeId::Resolved(v) | NodeId::Fallback(v) => *v,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::Resolved(v) => write!(f, "sym:{v}"),
            NodeId::Fallback(v) => write!(f, "name:{v:016x}"),
        }
    }
}

/// Polynomial hash (`h = h * 31 + c`) over the chars of `name`, wrapping on overflow.
///
/// Known approximation: not collision resistant.
pub fn name_hash(name: &str) -> u64 {
    name.chars()
        .fold(0u64, |h, c| h.wrapping_mul(31).wrapping_add(c as u64))
}
