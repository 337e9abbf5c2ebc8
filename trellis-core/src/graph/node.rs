//! Graph Nodes
//!
//! This module defines the per-instance record the graph keeps for every
//! node it owns: the behavior, the slot arenas, the solve state and the
//! cached outputs.

use std::fmt;

use indexmap::IndexMap;

use crate::node::{Node, Slot, SlotId};
use crate::value::Value;

/// Unique identifier for a node within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Solve state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    /// The cached outputs may not reflect the current inputs.
    Unsolved,

    /// The node is being solved right now.
    Solving,

    /// The cached outputs are the result of a successful solve.
    Solved,

    /// The node's inputs were rejected; every cached output is `Null`.
    SolvedInvalid,
}

impl SolveState {
    pub fn is_solved(self) -> bool {
        matches!(self, SolveState::Solved | SolveState::SolvedInvalid)
    }
}

/// An output slot together with the value last computed for it.
#[derive(Debug, Clone)]
pub(crate) struct OutputPort {
    pub(crate) slot: Slot,
    pub(crate) value: Value,
}

/// A node owned by a graph.
pub struct NodeInstance {
    id: NodeId,
    behavior: Box<dyn Node>,

    /// Input slots in positional order, keyed by stable handle.
    inputs: IndexMap<SlotId, Slot>,

    /// Output slots in positional order, with their cached values.
    outputs: IndexMap<SlotId, OutputPort>,

    /// Next slot handle to issue. Handles are never reused.
    next_slot: u32,

    state: SolveState,
}

impl NodeInstance {
    /// Wrap a behavior, declaring its slots.
    pub(crate) fn new(id: NodeId, behavior: Box<dyn Node>) -> Self {
        let shape = behavior.declare();
        let mut node = Self {
            id,
            behavior,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            next_slot: 0,
            state: SolveState::Unsolved,
        };
        for slot in shape.inputs {
            node.push_input(slot);
        }
        for slot in shape.outputs {
            node.push_output(slot);
        }
        node
    }

    fn issue_slot_id(&mut self) -> SlotId {
        let id = SlotId::new(self.next_slot);
        self.next_slot += 1;
        id
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_key(&self) -> &'static str {
        self.behavior.type_key()
    }

    pub(crate) fn behavior(&self) -> &dyn Node {
        self.behavior.as_ref()
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut dyn Node {
        self.behavior.as_mut()
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SolveState) {
        self.state = state;
    }

    /// Mark the node as needing a solve.
    pub(crate) fn mark_unsolved(&mut self) {
        self.state = SolveState::Unsolved;
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Input slots with their handles, in positional order.
    pub(crate) fn inputs(&self) -> impl Iterator<Item = (SlotId, &Slot)> {
        self.inputs.iter().map(|(id, slot)| (*id, slot))
    }

    pub fn input(&self, index: usize) -> Option<&Slot> {
        self.inputs.get_index(index).map(|(_, slot)| slot)
    }

    pub(crate) fn input_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.inputs.get_index_mut(index).map(|(_, slot)| slot)
    }

    pub fn output(&self, index: usize) -> Option<&Slot> {
        self.outputs.get_index(index).map(|(_, port)| &port.slot)
    }

    pub(crate) fn input_id(&self, index: usize) -> Option<SlotId> {
        self.inputs.get_index(index).map(|(id, _)| *id)
    }

    pub(crate) fn output_id(&self, index: usize) -> Option<SlotId> {
        self.outputs.get_index(index).map(|(id, _)| *id)
    }

    /// Current position of an input handle.
    pub(crate) fn input_index(&self, slot: SlotId) -> Option<usize> {
        self.inputs.get_index_of(&slot)
    }

    pub(crate) fn output_slots(&self) -> impl Iterator<Item = &Slot> {
        self.outputs.values().map(|port| &port.slot)
    }

    /// Cached value of an output, by position.
    pub fn output_value(&self, index: usize) -> Option<&Value> {
        self.outputs.get_index(index).map(|(_, port)| &port.value)
    }

    /// Cached value of an output, by handle. `Null` if the handle is gone.
    pub(crate) fn output_value_by_id(&self, slot: SlotId) -> &Value {
        static NULL: Value = Value::Null;
        self.outputs.get(&slot).map_or(&NULL, |port| &port.value)
    }

    pub fn output_values(&self) -> Vec<Value> {
        self.outputs.values().map(|port| port.value.clone()).collect()
    }

    /// Replace every cached output. `values` is in positional order and must
    /// match the output count.
    ///
    /// Returns whether any cached value changed.
    pub(crate) fn store_outputs(&mut self, values: Vec<Value>) -> bool {
        debug_assert_eq!(values.len(), self.outputs.len());
        let mut changed = false;
        for (port, value) in self.outputs.values_mut().zip(values) {
            if port.value != value {
                port.value = value;
                changed = true;
            }
        }
        changed
    }

    /// Replace every cached output with `Null`.
    pub(crate) fn null_fill(&mut self) -> bool {
        let nulls = vec![Value::Null; self.outputs.len()];
        self.store_outputs(nulls)
    }

    pub(crate) fn push_input(&mut self, slot: Slot) -> SlotId {
        let id = self.issue_slot_id();
        self.inputs.insert(id, slot);
        id
    }

    pub(crate) fn push_output(&mut self, slot: Slot) -> SlotId {
        let id = self.issue_slot_id();
        self.outputs.insert(
            id,
            OutputPort {
                slot,
                value: Value::Null,
            },
        );
        id
    }

    /// Remove an input by position, keeping the order of the rest.
    pub(crate) fn remove_input(&mut self, index: usize) -> Option<(SlotId, Slot)> {
        self.inputs.shift_remove_index(index)
    }

    pub(crate) fn remove_output(&mut self, index: usize) -> Option<(SlotId, Slot)> {
        self.outputs
            .shift_remove_index(index)
            .map(|(id, port)| (id, port.slot))
    }
}

impl fmt::Debug for NodeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInstance")
            .field("id", &self.id)
            .field("type_key", &self.type_key())
            .field("state", &self.state)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}
