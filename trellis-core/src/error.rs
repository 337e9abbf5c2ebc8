//! Structural Errors
//!
//! Errors returned by graph mutations and solve entry points. A failed
//! operation never leaves the graph partially modified.
//!
//! Problems local to one node (missing inputs, wrong kinds, a node rejecting
//! its inputs) are not errors at this level: they are reported as
//! [`Diagnostic`](crate::graph::Diagnostic)s and the pass continues.

use thiserror::Error;

use crate::graph::{NodeId, WireId};
use crate::value::Kind;

/// Which side of a node a slot index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Input => f.write_str("input"),
            Side::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("wire {0} does not exist")]
    WireNotFound(WireId),

    #[error("no node type registered as `{0}`")]
    UnknownNodeType(String),

    #[error("{side} slot {index} out of range on node {node} ({count} slots)")]
    SlotOutOfRange {
        node: NodeId,
        side: Side,
        index: usize,
        count: usize,
    },

    #[error("cannot wire {source_kind} output into {target_kind} input")]
    IncompatibleKind { source_kind: Kind, target_kind: Kind },

    #[error("wire from node {from} to node {to} would create a cycle")]
    WouldCreateCycle { from: NodeId, to: NodeId },

    #[error("input slot {index} on node {node} already has a wire")]
    InputOccupied { node: NodeId, index: usize },

    #[error("node {0} has a fixed slot layout")]
    FixedShape(NodeId),

    #[error("default for input slot {index} on node {node} must be {expected}, got {found}")]
    DefaultRejected {
        node: NodeId,
        index: usize,
        expected: Kind,
        found: Kind,
    },

    #[error("graph contains a cycle through node {0}")]
    CycleDetected(NodeId),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
