//! Topology
//!
//! The scheduler determines the order in which nodes are solved. It ensures
//! that every node runs after all nodes feeding its inputs.
//!
//! # Algorithm
//!
//! We use Kahn's algorithm over the node-level dependency relation:
//!
//! 1. Count, for every node, the distinct nodes feeding it (its in-degree)
//! 2. Seed a ready set with every node of in-degree zero
//! 3. Repeatedly take the ready node that was inserted into the graph first,
//!    append it to the order and decrement its dependents' in-degrees
//! 4. Nodes never reaching in-degree zero sit on a cycle
//!
//! Breaking ties by insertion position (a min-heap rather than a FIFO) makes
//! the order a pure function of the graph, so solves are reproducible.
//!
//! A topology is a snapshot: the graph rebuilds it after any change to its
//! node or wire sets.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use smallvec::SmallVec;

use super::node::NodeId;
use super::wire::{Wire, WireId};
use crate::error::{GraphError, Result};

type NodeList = SmallVec<[NodeId; 4]>;

/// Dependency snapshot of a graph.
#[derive(Debug, Default)]
pub struct Topology {
    /// All nodes, dependencies before dependents.
    order: Vec<NodeId>,

    /// Position of each node in `order`.
    rank: HashMap<NodeId, usize>,

    /// Distinct nodes feeding each node.
    dependencies: HashMap<NodeId, NodeList>,

    /// Distinct nodes fed by each node.
    dependents: HashMap<NodeId, NodeList>,

    /// Wires arriving at each node, in registration order.
    incoming: HashMap<NodeId, SmallVec<[WireId; 4]>>,
}

impl Topology {
    /// Build the topology of a graph.
    ///
    /// `nodes` must be in insertion order and `wires` in registration order.
    pub fn build<'a>(
        nodes: impl IntoIterator<Item = NodeId>,
        wires: impl IntoIterator<Item = &'a Wire>,
    ) -> Result<Self> {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        let mut topology = Topology::default();

        for &id in &nodes {
            topology.dependencies.insert(id, NodeList::new());
            topology.dependents.insert(id, NodeList::new());
        }

        for wire in wires {
            let from = wire.source().node;
            let to = wire.target().node;
            topology.incoming.entry(to).or_default().push(wire.id());

            let deps = topology.dependencies.entry(to).or_default();
            if !deps.contains(&from) {
                deps.push(from);
                topology.dependents.entry(from).or_default().push(to);
            }
        }

        topology.order = topology.sort(&nodes)?;
        topology.rank = topology
            .order
            .iter()
            .enumerate()
            .map(|(rank, id)| (*id, rank))
            .collect();

        Ok(topology)
    }

    /// Kahn's algorithm with insertion-order tie breaking.
    fn sort(&self, nodes: &[NodeId]) -> Result<Vec<NodeId>> {
        let position: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();

        let mut in_degree: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());
        let mut ready = BinaryHeap::new();

        for (pos, id) in nodes.iter().enumerate() {
            let degree = self.dependencies(*id).len();
            in_degree.insert(*id, degree);
            if degree == 0 {
                ready.push(Reverse(pos));
            }
        }

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(Reverse(pos)) = ready.pop() {
            let id = nodes[pos];
            order.push(id);

            for dependent in self.dependents(id) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.push(Reverse(position[dependent]));
                    }
                }
            }
        }

        if order.len() < nodes.len() {
            let stuck = nodes
                .iter()
                .copied()
                .find(|id| in_degree.get(id).is_some_and(|degree| *degree > 0))
                .unwrap_or(nodes[0]);
            return Err(GraphError::CycleDetected(stuck));
        }

        Ok(order)
    }

    /// All nodes, dependencies before dependents.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Distinct nodes feeding `node`.
    pub fn dependencies(&self, node: NodeId) -> &[NodeId] {
        self.dependencies.get(&node).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Distinct nodes fed by `node`.
    pub fn dependents(&self, node: NodeId) -> &[NodeId] {
        self.dependents.get(&node).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Wires arriving at `node`, in registration order.
    pub fn incoming(&self, node: NodeId) -> &[WireId] {
        self.incoming.get(&node).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Whether `to` can be reached from `from` by following wires downstream.
    /// A node reaches itself.
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        // Only nodes ranked between the two can lie on a path.
        if let (Some(a), Some(b)) = (self.rank.get(&from), self.rank.get(&to)) {
            if a > b {
                return false;
            }
        }
        self.downstream_closure([from]).contains(&to)
    }

    /// Every node reachable downstream from `origins`, origins included.
    pub fn downstream_closure(&self, origins: impl IntoIterator<Item = NodeId>) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = origins.into_iter().collect();

        // BFS over dependents
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            for dependent in self.dependents(id) {
                if !visited.contains(dependent) {
                    queue.push_back(*dependent);
                }
            }
        }

        visited
    }

    /// The global order restricted to `subset`, relative order preserved.
    pub fn restrict(&self, subset: &HashSet<NodeId>) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| subset.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::wire::Endpoint;
    use crate::node::SlotId;

    fn wire(id: u64, from: u64, to: u64) -> Wire {
        Wire::new(
            WireId::from(id),
            Endpoint {
                node: NodeId::from(from),
                slot: SlotId::new(0),
            },
            Endpoint {
                node: NodeId::from(to),
                slot: SlotId::new(0),
            },
        )
    }

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::from).collect()
    }

    #[test]
    fn orders_dependencies_first() {
        // 3 -> 1 -> 2, inserted as 1, 2, 3
        let wires = [wire(0, 3, 1), wire(1, 1, 2)];
        let topology = Topology::build(ids(&[1, 2, 3]), &wires).unwrap();
        assert_eq!(topology.order(), ids(&[3, 1, 2]).as_slice());
    }

    #[test]
    fn ties_break_by_insertion_order() {
        // Independent nodes keep insertion order, even when ids are not sorted.
        let topology = Topology::build(ids(&[5, 2, 9]), &Vec::<Wire>::new()).unwrap();
        assert_eq!(topology.order(), ids(&[5, 2, 9]).as_slice());

        // Diamond: 1 -> {2, 3} -> 4
        let wires = [wire(0, 1, 3), wire(1, 1, 2), wire(2, 2, 4), wire(3, 3, 4)];
        let topology = Topology::build(ids(&[1, 2, 3, 4]), &wires).unwrap();
        assert_eq!(topology.order(), ids(&[1, 2, 3, 4]).as_slice());
    }

    #[test]
    fn detects_cycles() {
        let wires = [wire(0, 1, 2), wire(1, 2, 3), wire(2, 3, 2)];
        let err = Topology::build(ids(&[1, 2, 3]), &wires).unwrap_err();
        assert_eq!(err, GraphError::CycleDetected(NodeId::from(2)));
    }

    #[test]
    fn parallel_wires_count_once() {
        let wires = [wire(0, 1, 2), wire(1, 1, 2)];
        let topology = Topology::build(ids(&[1, 2]), &wires).unwrap();
        assert_eq!(topology.dependencies(NodeId::from(2)), ids(&[1]).as_slice());
        assert_eq!(topology.incoming(NodeId::from(2)).len(), 2);
        assert_eq!(topology.order(), ids(&[1, 2]).as_slice());
    }

    #[test]
    fn closure_and_restriction() {
        // 1 -> 2 -> 3, 4 -> 3, 5 isolated
        let wires = [wire(0, 1, 2), wire(1, 2, 3), wire(2, 4, 3)];
        let topology = Topology::build(ids(&[1, 2, 3, 4, 5]), &wires).unwrap();

        let dirty = topology.downstream_closure([NodeId::from(2)]);
        assert_eq!(dirty.len(), 2);
        assert_eq!(topology.restrict(&dirty), ids(&[2, 3]));

        assert!(topology.reaches(NodeId::from(1), NodeId::from(3)));
        assert!(!topology.reaches(NodeId::from(3), NodeId::from(1)));
        assert!(!topology.reaches(NodeId::from(4), NodeId::from(2)));
    }
}
