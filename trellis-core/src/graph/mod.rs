//! Dependency Graph
//!
//! This module implements the graph that owns nodes and wires and keeps the
//! nodes' cached outputs consistent with their inputs.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are [`Node`] implementations with declared input and output slots
//! - Wires run from an output slot to an input slot: if a wire runs from B to
//!   A, then A depends on B
//!
//! When a node's inputs change, we collect every node downstream of it,
//! order them topologically and re-solve them. See the `solve` submodule for
//! the two solve modes.
//!
//! # Design Decisions
//!
//! 1. The graph is the only owner of node state. Nodes never see the graph;
//!    an event-driven node receives a [`TriggerHandle`] and can only enqueue
//!    itself for the next pass.
//!
//! 2. Structural mutations either fully apply or return an error and leave
//!    the graph untouched. A wire that would close a cycle is rejected up
//!    front, so the graph is acyclic at all times.
//!
//! 3. The topology is derived data. It is rebuilt lazily after any node or
//!    wire change and shared with a running pass through an `Arc`.
//!
//! 4. Nodes and wires live in insertion-ordered maps, so iteration, tie
//!    breaking and fan-in concatenation are deterministic.

mod node;
mod scheduler;
mod solve;
mod wire;

pub use node::{NodeId, NodeInstance, SolveState};
pub use scheduler::Topology;
pub use solve::{Diagnostic, SolveReport};
pub use wire::{compatible, Endpoint, Wire, WireId};

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result, Side};
use crate::node::{Access, Catalog, Node, NodeInfo, Slot};
use crate::trigger::{TriggerHandle, TriggerQueue};
use crate::value::Value;

/// A graph of nodes and wires, and the solver that evaluates it.
pub struct Graph {
    config: GraphConfig,
    catalog: Catalog,

    /// All nodes, in insertion order.
    nodes: IndexMap<NodeId, NodeInstance>,

    /// All wires, in registration order.
    wires: IndexMap<WireId, Wire>,

    next_node: u64,
    next_wire: u64,

    /// Pending re-solve requests from event-driven nodes.
    triggers: TriggerQueue,

    /// Cached topology, dropped on every structural change.
    topology: Option<Arc<Topology>>,

    /// Diagnostics of the most recent pass.
    diagnostics: Vec<Diagnostic>,
}

impl Graph {
    /// Create an empty graph drawing node types from `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, GraphConfig::default())
    }

    pub fn with_config(catalog: Catalog, config: GraphConfig) -> Self {
        Self {
            triggers: TriggerQueue::new(config.coalesce_triggers),
            config,
            catalog,
            nodes: IndexMap::new(),
            wires: IndexMap::new(),
            next_node: 0,
            next_wire: 0,
            topology: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Instantiate a node type from the catalog.
    pub fn add_node(&mut self, type_key: &str) -> Result<NodeId> {
        let behavior = self
            .catalog
            .create(type_key)
            .ok_or_else(|| GraphError::UnknownNodeType(type_key.to_owned()))?;
        Ok(self.insert_node(behavior))
    }

    /// Add an already constructed node.
    pub fn insert_node(&mut self, behavior: Box<dyn Node>) -> NodeId {
        let id = NodeId::from(self.next_node);
        self.next_node += 1;

        let instance = NodeInstance::new(id, behavior);
        debug!(node = %id, type_key = instance.type_key(), "node added");
        self.nodes.insert(id, instance);
        self.topology = None;
        id
    }

    /// Remove a node and every wire touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let mut instance = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::NodeNotFound(id))?;

        let touching: Vec<WireId> = self
            .wires
            .values()
            .filter(|wire| wire.touches(id))
            .map(Wire::id)
            .collect();
        for wire_id in touching {
            self.detach_wire(wire_id);
        }

        instance.behavior_mut().on_remove();
        self.triggers.forget(id);
        self.topology = None;

        debug!(node = %id, type_key = instance.type_key(), "node removed");
        Ok(())
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeInstance> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeInstance> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn info(&self, id: NodeId) -> Result<NodeInfo> {
        Ok(self.node(id)?.behavior().info())
    }

    pub fn state(&self, id: NodeId) -> Result<SolveState> {
        Ok(self.node(id)?.state())
    }

    pub fn input_slot(&self, id: NodeId, index: usize) -> Result<&Slot> {
        let node = self.node(id)?;
        node.input(index).ok_or(GraphError::SlotOutOfRange {
            node: id,
            side: Side::Input,
            index,
            count: node.input_count(),
        })
    }

    pub fn output_slot(&self, id: NodeId, index: usize) -> Result<&Slot> {
        let node = self.node(id)?;
        node.output(index).ok_or(GraphError::SlotOutOfRange {
            node: id,
            side: Side::Output,
            index,
            count: node.output_count(),
        })
    }

    /// Replace the default of an input slot, as when a user edits a value in
    /// place. `Value::Null` clears the default.
    ///
    /// The node is left unsolved; call [`Graph::quick_solve`] with it as the
    /// origin to propagate the change.
    pub fn set_default(&mut self, id: NodeId, index: usize, value: Value) -> Result<()> {
        let slot = self.input_slot(id, index)?;
        if !slot.accepts_default(&value) {
            let found = match (&value, slot.access()) {
                (Value::List(items), Access::List) => items
                    .iter()
                    .map(Value::kind)
                    .find(|kind| !slot.kind().accepts(*kind))
                    .unwrap_or(value.kind()),
                _ => value.kind(),
            };
            return Err(GraphError::DefaultRejected {
                node: id,
                index,
                expected: slot.kind(),
                found,
            });
        }

        let node = self.node_mut(id)?;
        if let Some(slot) = node.input_mut(index) {
            slot.set_default((!value.is_null()).then_some(value));
        }
        node.mark_unsolved();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dynamic slots
    // ------------------------------------------------------------------

    /// Append an input to a dynamic node. Returns the new slot's position.
    pub fn add_input(&mut self, id: NodeId) -> Result<usize> {
        let node = self.node_mut(id)?;
        let position = node.input_count();
        let slot = node
            .behavior()
            .dynamic_input(position)
            .ok_or(GraphError::FixedShape(id))?;
        node.push_input(slot);
        node.mark_unsolved();
        Ok(position)
    }

    /// Append an output to a dynamic node. Returns the new slot's position.
    pub fn add_output(&mut self, id: NodeId) -> Result<usize> {
        let node = self.node_mut(id)?;
        let position = node.output_count();
        let slot = node
            .behavior()
            .dynamic_output(position)
            .ok_or(GraphError::FixedShape(id))?;
        node.push_output(slot);
        node.mark_unsolved();
        Ok(position)
    }

    /// Remove an input from a dynamic node, along with the wires feeding it.
    /// Wires on the remaining inputs are unaffected.
    pub fn remove_input(&mut self, id: NodeId, index: usize) -> Result<Slot> {
        let slot_id = {
            let node = self.node(id)?;
            if node.behavior().dynamic_input(node.input_count()).is_none() {
                return Err(GraphError::FixedShape(id));
            }
            node.input_id(index).ok_or(GraphError::SlotOutOfRange {
                node: id,
                side: Side::Input,
                index,
                count: node.input_count(),
            })?
        };

        let feeding: Vec<WireId> = self
            .wires
            .values()
            .filter(|wire| wire.target() == Endpoint { node: id, slot: slot_id })
            .map(Wire::id)
            .collect();
        for wire_id in feeding {
            self.detach_wire(wire_id);
        }

        let node = self.node_mut(id)?;
        let (_, slot) = node.remove_input(index).ok_or(GraphError::SlotOutOfRange {
            node: id,
            side: Side::Input,
            index,
            count: node.input_count(),
        })?;
        node.mark_unsolved();
        self.topology = None;
        Ok(slot)
    }

    /// Remove an output from a dynamic node, along with the wires leaving it.
    pub fn remove_output(&mut self, id: NodeId, index: usize) -> Result<Slot> {
        let slot_id = {
            let node = self.node(id)?;
            if node.behavior().dynamic_output(node.output_count()).is_none() {
                return Err(GraphError::FixedShape(id));
            }
            node.output_id(index).ok_or(GraphError::SlotOutOfRange {
                node: id,
                side: Side::Output,
                index,
                count: node.output_count(),
            })?
        };

        let leaving: Vec<WireId> = self
            .wires
            .values()
            .filter(|wire| wire.source() == Endpoint { node: id, slot: slot_id })
            .map(Wire::id)
            .collect();
        for wire_id in leaving {
            self.detach_wire(wire_id);
        }

        let node = self.node_mut(id)?;
        let (_, slot) = node.remove_output(index).ok_or(GraphError::SlotOutOfRange {
            node: id,
            side: Side::Output,
            index,
            count: node.output_count(),
        })?;
        node.mark_unsolved();
        self.topology = None;
        Ok(slot)
    }

    // ------------------------------------------------------------------
    // Wires
    // ------------------------------------------------------------------

    /// Connect output `output` of `source` to input `input` of `target`.
    ///
    /// Fails without touching the graph if either slot does not exist, the
    /// kinds are incompatible, the wire would close a cycle, or the target
    /// is an item input that already has a wire.
    pub fn add_wire(
        &mut self,
        source: NodeId,
        output: usize,
        target: NodeId,
        input: usize,
    ) -> Result<WireId> {
        let source_slot = self.output_slot(source, output)?;
        let target_slot = self.input_slot(target, input)?;

        if !compatible(source_slot, target_slot) {
            let (source_kind, target_kind) = wire::mismatch_kinds(source_slot, target_slot);
            return Err(GraphError::IncompatibleKind {
                source_kind,
                target_kind,
            });
        }
        let target_access = target_slot.access();

        if self.topology()?.reaches(target, source) {
            return Err(GraphError::WouldCreateCycle {
                from: source,
                to: target,
            });
        }

        let source_end = Endpoint {
            node: source,
            slot: self.node(source)?.output_id(output).ok_or(GraphError::NodeNotFound(source))?,
        };
        let target_end = Endpoint {
            node: target,
            slot: self.node(target)?.input_id(input).ok_or(GraphError::NodeNotFound(target))?,
        };

        if target_access == Access::Item
            && self.wires.values().any(|wire| wire.target() == target_end)
        {
            return Err(GraphError::InputOccupied {
                node: target,
                index: input,
            });
        }

        let id = WireId::from(self.next_wire);
        self.next_wire += 1;
        self.wires.insert(id, Wire::new(id, source_end, target_end));
        self.node_mut(target)?.mark_unsolved();
        self.topology = None;

        debug!(wire = %id, from = %source, to = %target, "wire added");
        Ok(id)
    }

    /// Disconnect a wire. Its target is left unsolved.
    pub fn remove_wire(&mut self, id: WireId) -> Result<Wire> {
        let wire = self.detach_wire(id).ok_or(GraphError::WireNotFound(id))?;
        debug!(wire = %id, "wire removed");
        Ok(wire)
    }

    /// Drop a wire and mark its target unsolved.
    fn detach_wire(&mut self, id: WireId) -> Option<Wire> {
        let wire = self.wires.shift_remove(&id)?;
        if let Some(target) = self.nodes.get_mut(&wire.target().node) {
            target.mark_unsolved();
        }
        self.topology = None;
        Some(wire)
    }

    pub fn wire(&self, id: WireId) -> Result<&Wire> {
        self.wires.get(&id).ok_or(GraphError::WireNotFound(id))
    }

    /// Wires in registration order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.values()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Wires feeding input `input` of `target`, in registration order.
    pub fn wires_into(&self, target: NodeId, input: usize) -> Result<Vec<WireId>> {
        let slot = self
            .node(target)?
            .input_id(input)
            .ok_or(GraphError::SlotOutOfRange {
                node: target,
                side: Side::Input,
                index: input,
                count: self.node(target)?.input_count(),
            })?;
        let end = Endpoint { node: target, slot };
        Ok(self
            .wires
            .values()
            .filter(|wire| wire.target() == end)
            .map(Wire::id)
            .collect())
    }

    // ------------------------------------------------------------------
    // Topology & read-back
    // ------------------------------------------------------------------

    /// The current topology, rebuilding it if the graph changed.
    pub(crate) fn topology(&mut self) -> Result<Arc<Topology>> {
        if let Some(topology) = &self.topology {
            return Ok(Arc::clone(topology));
        }
        let topology = Arc::new(Topology::build(self.nodes.keys().copied(), self.wires.values())?);
        self.topology = Some(Arc::clone(&topology));
        Ok(topology)
    }

    /// All nodes, dependencies before dependents, ties in insertion order.
    pub fn topological_order(&mut self) -> Result<Vec<NodeId>> {
        Ok(self.topology()?.order().to_vec())
    }

    /// The last value computed for an output. `Null` if the node has never
    /// been solved or was invalid.
    pub fn get_output(&self, id: NodeId, index: usize) -> Result<Value> {
        let node = self.node(id)?;
        node.output_value(index)
            .cloned()
            .ok_or(GraphError::SlotOutOfRange {
                node: id,
                side: Side::Output,
                index,
                count: node.output_count(),
            })
    }

    /// Every cached output of a node, in positional order.
    pub fn outputs(&self, id: NodeId) -> Result<Vec<Value>> {
        Ok(self.node(id)?.output_values())
    }

    /// Diagnostics recorded by the most recent solve.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // ------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------

    /// A handle through which `id` can request re-solves from outside a pass.
    pub fn trigger_handle(&self, id: NodeId) -> Result<TriggerHandle> {
        self.node(id)?;
        Ok(self.triggers.handle(id))
    }

    /// Number of queued re-solve requests.
    pub fn pending_triggers(&self) -> usize {
        self.triggers.len()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("wires", &self.wires.len())
            .field("pending_triggers", &self.triggers.len())
            .finish()
    }
}
