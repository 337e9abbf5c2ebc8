//! Solve Passes
//!
//! Two entry points evaluate a graph:
//!
//! - [`Graph::full_solve`] re-solves every node in topological order.
//! - [`Graph::quick_solve`] re-solves only what an external change can have
//!   affected: the origin node and everything downstream of it.
//!
//! # Quick solve
//!
//! 1. Mark the origin (plus any pending triggers and any node a structural
//!    edit left unsolved) as dirty
//! 2. Collect the downstream closure of the dirty nodes
//! 3. Restrict the global topological order to that closure
//! 4. Solve the closure in that order; everything else keeps its cache
//!
//! With early cutoff enabled, a node in the closure that was solved before
//! is only re-solved when an upstream node changed one of its outputs during
//! this pass. Such a change moves the node back to `Unsolved` before the
//! pass reaches it. Every other node is skipped, and its cached outputs
//! already equal what a re-solve would produce.
//!
//! After a quick solve every cached output equals what a full solve would
//! have produced.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::{Graph, NodeId, SolveState, Topology};
use crate::error::Result;
use crate::node::{SolveContext, SolveError, ValidationFailure};
use crate::value::Value;

/// A node that ended a pass solved-but-invalid, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub node: NodeId,
    pub type_key: &'static str,
    pub error: SolveError,
}

/// What one or more passes did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveReport {
    /// Nodes whose `solve` was attempted, in execution order.
    pub solved: Vec<NodeId>,

    /// Dirty nodes skipped by early cutoff.
    pub skipped: Vec<NodeId>,

    /// Nodes that ended solved-but-invalid.
    pub diagnostics: Vec<Diagnostic>,
}

impl SolveReport {
    pub fn was_solved(&self, id: NodeId) -> bool {
        self.solved.contains(&id)
    }

    /// Whether every attempted node solved successfully.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn absorb(&mut self, other: SolveReport) {
        self.solved.extend(other.solved);
        self.skipped.extend(other.skipped);
        self.diagnostics.extend(other.diagnostics);
    }
}

impl Graph {
    /// Re-solve every node in topological order.
    pub fn full_solve(&mut self) -> Result<SolveReport> {
        let topology = self.topology()?;
        let order = topology.order().to_vec();
        debug!(nodes = order.len(), "full solve");

        let origins: HashSet<NodeId> = order.iter().copied().collect();
        let report = self.run_pass(&topology, &order, &origins, false);
        Ok(report)
    }

    /// Re-solve `origin` and everything downstream of it.
    ///
    /// Pending trigger requests are drained into the same pass.
    pub fn quick_solve(&mut self, origin: NodeId) -> Result<SolveReport> {
        self.node(origin)?;
        let mut origins = vec![origin];
        origins.extend(self.triggers.drain());
        self.solve_from(origins)
    }

    /// Drain pending trigger requests.
    ///
    /// With coalescing, all pending nodes are solved together in one pass.
    /// Without it, each request gets its own pass, up to
    /// `max_pump_passes`; the rest stay queued.
    pub fn pump(&mut self) -> Result<SolveReport> {
        if self.config.coalesce_triggers {
            let origins = self.triggers.drain();
            if origins.is_empty() {
                return Ok(SolveReport::default());
            }
            return self.solve_from(origins);
        }

        let mut report = SolveReport::default();
        for _ in 0..self.config.max_pump_passes {
            let Some(origin) = self.triggers.pop() else {
                break;
            };
            report.absorb(self.solve_from(vec![origin])?);
        }
        self.diagnostics = report.diagnostics.clone();
        Ok(report)
    }

    fn solve_from(&mut self, origins: Vec<NodeId>) -> Result<SolveReport> {
        let mut origins: HashSet<NodeId> = origins
            .into_iter()
            .filter(|id| self.nodes.contains_key(id))
            .collect();

        // Structural edits leave nodes unsolved; they join the pass too.
        origins.extend(
            self.nodes
                .values()
                .filter(|node| node.state() == SolveState::Unsolved)
                .map(|node| node.id()),
        );

        for id in &origins {
            if let Some(node) = self.nodes.get_mut(id) {
                node.mark_unsolved();
            }
        }

        let topology = self.topology()?;
        let dirty = topology.downstream_closure(origins.iter().copied());
        let order = topology.restrict(&dirty);
        debug!(
            origins = origins.len(),
            dirty = order.len(),
            nodes = self.nodes.len(),
            "quick solve"
        );

        let cutoff = self.config.early_cutoff;
        Ok(self.run_pass(&topology, &order, &origins, cutoff))
    }

    fn run_pass(
        &mut self,
        topology: &Topology,
        order: &[NodeId],
        origins: &HashSet<NodeId>,
        cutoff: bool,
    ) -> SolveReport {
        let mut report = SolveReport::default();

        for &id in order {
            let needs_solve = !cutoff
                || origins.contains(&id)
                || self.nodes.get(&id).is_some_and(|node| node.state() == SolveState::Unsolved);

            if !needs_solve {
                trace!(node = %id, "unchanged upstream, skipped");
                report.skipped.push(id);
                continue;
            }

            let (changed, diagnostic) = self.solve_node(topology, id);
            report.solved.push(id);
            if let Some(diagnostic) = diagnostic {
                report.diagnostics.push(diagnostic);
            }

            if changed {
                for dependent in topology.dependents(id) {
                    if let Some(node) = self.nodes.get_mut(dependent) {
                        node.mark_unsolved();
                    }
                }
            }
        }

        debug!(
            solved = report.solved.len(),
            skipped = report.skipped.len(),
            invalid = report.diagnostics.len(),
            "pass finished"
        );
        self.diagnostics = report.diagnostics.clone();
        report
    }

    /// Gather the values arriving on each input, in positional order.
    fn resolve_inputs(&self, topology: &Topology, id: NodeId) -> Vec<Value> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };

        let mut incoming: Vec<Vec<Value>> = vec![Vec::new(); node.input_count()];
        for wire_id in topology.incoming(id) {
            let Some(wire) = self.wires.get(wire_id) else {
                continue;
            };
            let Some(position) = node.input_index(wire.target().slot) else {
                continue;
            };
            let value = self
                .nodes
                .get(&wire.source().node)
                .map(|source| source.output_value_by_id(wire.source().slot).clone())
                .unwrap_or_default();
            incoming[position].push(value);
        }

        node.inputs()
            .zip(incoming)
            .map(|((_, slot), values)| slot.resolve(&values))
            .collect()
    }

    /// Solve a single node, caching its outputs.
    ///
    /// Returns whether any cached output changed, and a diagnostic if the
    /// node ended solved-but-invalid.
    fn solve_node(&mut self, topology: &Topology, id: NodeId) -> (bool, Option<Diagnostic>) {
        let inputs = self.resolve_inputs(topology, id);
        let triggers = &self.triggers;
        let Some(node) = self.nodes.get_mut(&id) else {
            return (false, None);
        };

        node.set_state(SolveState::Solving);
        let result = check_inputs(node, &inputs)
            .and_then(|()| node.behavior().validate(&inputs).map_err(SolveError::from))
            .and_then(|()| {
                let ctx = SolveContext::new(id, triggers).with_outputs(node.output_count());
                node.behavior_mut().solve(&inputs, &ctx)
            })
            .and_then(|outputs| check_outputs(node, outputs));

        match result {
            Ok(outputs) => {
                let changed = node.store_outputs(outputs);
                node.set_state(SolveState::Solved);
                trace!(node = %id, type_key = node.type_key(), changed, "solved");
                (changed, None)
            }
            Err(error) => {
                let changed = node.null_fill();
                node.set_state(SolveState::SolvedInvalid);
                warn!(node = %id, type_key = node.type_key(), %error, "node solved invalid");
                let diagnostic = Diagnostic {
                    node: id,
                    type_key: node.type_key(),
                    error,
                };
                (changed, Some(diagnostic))
            }
        }
    }
}

/// Presence and kind checks every node gets before its own validation.
fn check_inputs(node: &super::NodeInstance, inputs: &[Value]) -> Result<(), SolveError> {
    for ((_, slot), value) in node.inputs().zip(inputs) {
        if value.is_null() {
            if slot.is_optional() {
                continue;
            }
            return Err(ValidationFailure::MissingInput {
                slot: slot.variable().to_owned(),
            }
            .into());
        }
        if !slot.accepts(value) {
            let found = match value {
                Value::List(items) => items
                    .iter()
                    .map(Value::kind)
                    .find(|kind| !slot.kind().accepts(*kind))
                    .unwrap_or(value.kind()),
                other => other.kind(),
            };
            return Err(ValidationFailure::WrongKind {
                slot: slot.variable().to_owned(),
                expected: slot.kind(),
                found,
            }
            .into());
        }
    }
    Ok(())
}

/// Arity and kind checks on what a node produced.
fn check_outputs(node: &super::NodeInstance, outputs: Vec<Value>) -> Result<Vec<Value>, SolveError> {
    if outputs.len() != node.output_count() {
        return Err(SolveError::OutputArity {
            expected: node.output_count(),
            actual: outputs.len(),
        });
    }
    for (slot, value) in node.output_slots().zip(&outputs) {
        if !slot.accepts(value) {
            return Err(SolveError::OutputKind {
                slot: slot.variable().to_owned(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::error::GraphError;
    use crate::node::Catalog;

    /// `a` and `b` integer inputs feeding `sum`.
    fn adder(config: GraphConfig) -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::with_config(Catalog::builtin(), config);
        let a = graph.add_node("input.integer").unwrap();
        let b = graph.add_node("input.integer").unwrap();
        let sum = graph.add_node("maths.addition").unwrap();
        graph.add_wire(a, 0, sum, 0).unwrap();
        graph.add_wire(b, 0, sum, 1).unwrap();
        graph.set_default(a, 0, Value::Int(5)).unwrap();
        graph.set_default(b, 0, Value::Int(3)).unwrap();
        (graph, a, b, sum)
    }

    #[test]
    fn full_solve_visits_every_node_in_order() {
        let (mut graph, a, b, sum) = adder(GraphConfig::default());
        let report = graph.full_solve().unwrap();

        assert_eq!(report.solved, vec![a, b, sum]);
        assert!(report.is_clean());
        assert_eq!(graph.get_output(sum, 0), Ok(Value::Int(8)));
        assert_eq!(graph.state(sum), Ok(SolveState::Solved));
    }

    #[test]
    fn quick_solve_only_touches_downstream() {
        let (mut graph, a, b, sum) = adder(GraphConfig::default());
        graph.full_solve().unwrap();

        graph.set_default(a, 0, Value::Int(10)).unwrap();
        let report = graph.quick_solve(a).unwrap();

        assert_eq!(report.solved, vec![a, sum]);
        assert!(!report.was_solved(b));
        assert_eq!(graph.get_output(sum, 0), Ok(Value::Int(13)));
    }

    #[test]
    fn unchanged_origin_cuts_off_downstream() {
        let (mut graph, a, _, sum) = adder(GraphConfig::default());
        graph.full_solve().unwrap();

        // Same value again: the origin re-solves but publishes nothing new.
        graph.set_default(a, 0, Value::Int(5)).unwrap();
        let report = graph.quick_solve(a).unwrap();
        assert_eq!(report.solved, vec![a]);
        assert_eq!(report.skipped, vec![sum]);
        assert_eq!(graph.state(sum), Ok(SolveState::Solved));
    }

    #[test]
    fn without_cutoff_every_dirty_node_solves() {
        let (mut graph, a, _, sum) = adder(GraphConfig::default().with_early_cutoff(false));
        graph.full_solve().unwrap();

        let report = graph.quick_solve(a).unwrap();
        assert_eq!(report.solved, vec![a, sum]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn structural_edits_join_the_next_quick_solve() {
        let (mut graph, a, b, _) = adder(GraphConfig::default());
        graph.full_solve().unwrap();

        let average = graph.add_node("maths.mass_average").unwrap();
        graph.add_wire(b, 0, average, 0).unwrap();

        // `a` is the origin, yet the new node is solved too.
        let report = graph.quick_solve(a).unwrap();
        assert!(report.was_solved(average));
        assert_eq!(graph.get_output(average, 0), Ok(Value::Float(3.0)));
    }

    #[test]
    fn invalid_nodes_null_fill_and_report() {
        let mut graph = Graph::default();
        let polygon = graph.add_node("curve.polygon").unwrap();
        let sides = graph.add_node("input.integer").unwrap();
        graph.add_wire(sides, 0, polygon, 0).unwrap();
        graph.set_default(sides, 0, Value::Int(2)).unwrap();

        let report = graph.full_solve().unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        let diagnostic = &report.diagnostics[0];
        assert_eq!(diagnostic.node, polygon);
        assert_eq!(diagnostic.type_key, "curve.polygon");
        assert_eq!(
            diagnostic.error,
            SolveError::Invalid(ValidationFailure::rejected("N must be >= 3"))
        );

        assert_eq!(graph.get_output(polygon, 0), Ok(Value::Null));
        assert_eq!(graph.state(polygon), Ok(SolveState::SolvedInvalid));
        assert_eq!(graph.diagnostics(), report.diagnostics.as_slice());

        // Fixing the input recovers the node.
        graph.set_default(sides, 0, Value::Int(6)).unwrap();
        let report = graph.quick_solve(sides).unwrap();
        assert!(report.is_clean());
        assert!(graph.diagnostics().is_empty());
        assert_eq!(graph.state(polygon), Ok(SolveState::Solved));
    }

    #[test]
    fn missing_required_input_is_a_diagnostic() {
        let mut graph = Graph::default();
        let split = graph.add_node("vector.deconstruct").unwrap();

        let report = graph.full_solve().unwrap();
        assert_eq!(
            report.diagnostics[0].error,
            SolveError::Invalid(ValidationFailure::MissingInput { slot: "V".into() })
        );
        assert_eq!(graph.outputs(split), Ok(vec![Value::Null; 3]));
    }

    #[test]
    fn quick_solve_requires_an_existing_origin() {
        let (mut graph, a, _, _) = adder(GraphConfig::default());
        graph.remove_node(a).unwrap();
        assert_eq!(graph.quick_solve(a), Err(GraphError::NodeNotFound(a)));
    }

    #[test]
    fn coalesced_pump_runs_one_pass() {
        let (mut graph, a, b, sum) = adder(GraphConfig::default());
        graph.full_solve().unwrap();

        let handle = graph.trigger_handle(a).unwrap();
        handle.request();
        handle.request();
        graph.trigger_handle(b).unwrap().request();
        assert_eq!(graph.pending_triggers(), 2);

        let report = graph.pump().unwrap();
        assert_eq!(report.solved, vec![a, b]);
        assert_eq!(report.skipped, vec![sum]);
        assert_eq!(graph.pending_triggers(), 0);

        assert_eq!(graph.pump().unwrap(), SolveReport::default());
    }

    #[test]
    fn uncoalesced_pump_is_bounded() {
        let config = GraphConfig::default()
            .with_coalesce_triggers(false)
            .with_max_pump_passes(2);
        let (mut graph, a, _, _) = adder(config);
        graph.full_solve().unwrap();

        let handle = graph.trigger_handle(a).unwrap();
        for _ in 0..3 {
            handle.request();
        }

        let report = graph.pump().unwrap();
        assert_eq!(report.solved, vec![a, a]);
        assert_eq!(graph.pending_triggers(), 1);

        graph.pump().unwrap();
        assert_eq!(graph.pending_triggers(), 0);
    }

    #[test]
    fn quick_solve_drains_pending_triggers() {
        let (mut graph, a, b, _) = adder(GraphConfig::default());
        graph.full_solve().unwrap();

        graph.trigger_handle(b).unwrap().request();
        let report = graph.quick_solve(a).unwrap();
        assert!(report.was_solved(a));
        assert!(report.was_solved(b));
        assert_eq!(graph.pending_triggers(), 0);
    }
}
