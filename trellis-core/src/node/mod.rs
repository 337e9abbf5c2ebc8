//! Node Contract
//!
//! A node is a small computational unit. It declares its input and output
//! slots once, and turns resolved input values into output values in
//! [`Node::solve`]. Everything else (wiring, ordering, caching, handling of
//! invalid inputs) belongs to the [`Graph`](crate::Graph).
//!
//! # Lifecycle of one solve
//!
//! 1. The graph resolves every input slot from its wires or default.
//! 2. The graph checks that no non-optional input is `Null` and that every
//!    input matches its slot's kind.
//! 3. The node's own [`Node::validate`] runs any semantic checks.
//! 4. [`Node::solve`] runs and returns one value per output slot.
//!
//! If any step fails the graph fills every output with `Null` and records a
//! diagnostic. A node never has to produce the null outputs itself, but it
//! may bail out of `solve` early with [`SolveError::Invalid`].

pub mod catalog;
pub mod slot;

use thiserror::Error;

use crate::graph::NodeId;
use crate::trigger::{TriggerHandle, TriggerQueue};
use crate::value::{Kind, TypeMismatch, Value};

pub use catalog::Catalog;
pub use slot::{Access, Slot, SlotId};

/// Descriptive metadata for a node type, used by hosts to build menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: &'static str,
    pub full_name: &'static str,
    pub description: &'static str,
    pub group: &'static str,
    pub subgroup: &'static str,
}

/// The slots a node declares when it joins a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub inputs: Vec<Slot>,
    pub outputs: Vec<Slot>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, slot: Slot) -> Self {
        self.inputs.push(slot);
        self
    }

    pub fn output(mut self, slot: Slot) -> Self {
        self.outputs.push(slot);
        self
    }
}

/// Why a node's inputs were rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("input `{slot}` is unset")]
    MissingInput { slot: String },

    #[error("input `{slot}` expects {expected}, received {found}")]
    WrongKind {
        slot: String,
        expected: Kind,
        found: Kind,
    },

    #[error("{0}")]
    Rejected(String),
}

impl ValidationFailure {
    /// A semantic rejection raised by the node itself.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Everything that can leave a node solved-but-invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("node produced {actual} outputs but declares {expected}")]
    OutputArity { expected: usize, actual: usize },

    #[error("output `{slot}` declares {expected} but node produced {found}")]
    OutputKind {
        slot: String,
        expected: Kind,
        found: Kind,
    },
}

/// Per-solve access to the engine, handed to [`Node::solve`].
///
/// The only thing a node may do with the engine is request its own
/// re-solve through a [`TriggerHandle`].
pub struct SolveContext<'a> {
    node: NodeId,
    outputs: usize,
    triggers: &'a TriggerQueue,
}

impl<'a> SolveContext<'a> {
    pub(crate) fn new(node: NodeId, triggers: &'a TriggerQueue) -> Self {
        Self {
            node,
            outputs: 0,
            triggers,
        }
    }

    pub(crate) fn with_outputs(mut self, outputs: usize) -> Self {
        self.outputs = outputs;
        self
    }

    /// Id of the node being solved.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Number of output slots the node currently has. Nodes with dynamic
    /// outputs return this many values.
    pub fn output_count(&self) -> usize {
        self.outputs
    }

    /// A handle the node can keep (e.g. inside an event subscription) to
    /// request a re-solve later.
    pub fn trigger(&self) -> TriggerHandle {
        self.triggers.handle(self.node)
    }
}

/// The contract every node type implements.
pub trait Node: Send {
    /// Stable identifier of the node type, as registered in a [`Catalog`].
    fn type_key(&self) -> &'static str;

    fn info(&self) -> NodeInfo;

    /// Declare input and output slots. Called once when the node is added.
    fn declare(&self) -> Shape;

    /// Semantic checks beyond kind and presence, which the graph has already
    /// verified.
    fn validate(&self, _inputs: &[Value]) -> Result<(), ValidationFailure> {
        Ok(())
    }

    /// Compute one value per output slot from the resolved inputs.
    fn solve(&mut self, inputs: &[Value], ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError>;

    /// Slot appended by [`Graph::add_input`](crate::Graph::add_input) when
    /// the node currently has `position` inputs. `None` marks a fixed shape.
    fn dynamic_input(&self, _position: usize) -> Option<Slot> {
        None
    }

    /// Output counterpart of [`Node::dynamic_input`].
    fn dynamic_output(&self, _position: usize) -> Option<Slot> {
        None
    }

    /// Called when the node is removed from its graph. Nodes holding external
    /// subscriptions release them here.
    fn on_remove(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_builder_keeps_declaration_order() {
        let shape = Shape::new()
            .input(Slot::new("X", "X", Kind::Float))
            .input(Slot::new("Y", "Y", Kind::Float))
            .output(Slot::new("Sum", "S", Kind::Float));

        let names: Vec<_> = shape.inputs.iter().map(Slot::variable).collect();
        assert_eq!(names, vec!["X", "Y"]);
        assert_eq!(shape.outputs.len(), 1);
    }

    #[test]
    fn solve_error_wraps_failures() {
        let err: SolveError = ValidationFailure::rejected("N must be >= 3").into();
        assert_eq!(err.to_string(), "N must be >= 3");

        let err: SolveError = TypeMismatch {
            expected: Kind::Int,
            found: Kind::Null,
        }
        .into();
        assert!(matches!(err, SolveError::TypeMismatch(_)));
    }

    #[test]
    fn context_hands_out_handles_for_its_node() {
        let queue = TriggerQueue::new(true);
        let ctx = SolveContext::new(NodeId::from(9), &queue);

        assert_eq!(ctx.node_id(), NodeId::from(9));
        assert_eq!(ctx.output_count(), 0);
        ctx.trigger().request();
        assert_eq!(queue.pop(), Some(NodeId::from(9)));
        assert_eq!(ctx.with_outputs(3).output_count(), 3);
    }
}
