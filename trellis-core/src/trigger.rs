//! External Triggers
//!
//! Some nodes react to events that happen outside the graph: a button is
//! pressed, a slider is dragged. Such a node must not call back into the
//! graph while the event fires. Instead it holds a [`TriggerHandle`] and asks
//! for a re-solve, which only enqueues its id on the graph's pending queue.
//! The host drains the queue with [`Graph::pump`](crate::Graph::pump) or the
//! next [`Graph::quick_solve`](crate::Graph::quick_solve).
//!
//! # Coalescing
//!
//! When coalescing is enabled (the default) a node appears in the queue at
//! most once, no matter how many times it fired since the last drain.
//! Otherwise every request is kept, in arrival order.
//!
//! # Thread Safety
//!
//! The queue sits behind an `Arc<Mutex<_>>` so handles may be moved to the
//! thread that owns the event source. Handles keep only a weak reference:
//! a handle outliving its graph simply stops delivering requests.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::graph::NodeId;

#[derive(Debug)]
struct Pending {
    coalesce: bool,
    queue: VecDeque<NodeId>,
}

impl Pending {
    fn push(&mut self, node: NodeId) {
        if self.coalesce && self.queue.contains(&node) {
            return;
        }
        self.queue.push_back(node);
    }
}

/// The graph-owned queue of pending re-solve requests.
#[derive(Debug)]
pub struct TriggerQueue {
    inner: Arc<Mutex<Pending>>,
}

impl TriggerQueue {
    pub fn new(coalesce: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Pending {
                coalesce,
                queue: VecDeque::new(),
            })),
        }
    }

    /// Create a handle through which `node` can request re-solves.
    pub fn handle(&self, node: NodeId) -> TriggerHandle {
        TriggerHandle {
            node,
            queue: Arc::downgrade(&self.inner),
        }
    }

    /// Enqueue a request directly.
    pub fn push(&self, node: NodeId) {
        self.inner.lock().push(node);
    }

    /// Take the oldest pending request.
    pub fn pop(&self) -> Option<NodeId> {
        self.inner.lock().queue.pop_front()
    }

    /// Take every pending request, oldest first, without duplicates.
    pub fn drain(&self) -> Vec<NodeId> {
        let mut pending = self.inner.lock();
        let mut drained: Vec<NodeId> = Vec::with_capacity(pending.queue.len());
        for node in pending.queue.drain(..) {
            if !drained.contains(&node) {
                drained.push(node);
            }
        }
        drained
    }

    /// Drop every request made by `node`.
    pub fn forget(&self, node: NodeId) {
        self.inner.lock().queue.retain(|n| *n != node);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }
}

/// A node's channel for requesting its own re-solve.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    node: NodeId,
    queue: Weak<Mutex<Pending>>,
}

impl TriggerHandle {
    /// The node this handle requests re-solves for.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Ask the graph to re-solve this node and its downstream on the next
    /// pump.
    ///
    /// Returns `false` if the graph no longer exists.
    pub fn request(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                queue.lock().push(self.node);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalescing_keeps_one_marker_per_node() {
        let queue = TriggerQueue::new(true);
        let handle = queue.handle(NodeId::from(1));

        handle.request();
        handle.request();
        queue.push(NodeId::from(2));
        handle.request();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain(), vec![NodeId::from(1), NodeId::from(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn without_coalescing_every_request_is_kept() {
        let queue = TriggerQueue::new(false);
        let handle = queue.handle(NodeId::from(1));

        handle.request();
        handle.request();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(NodeId::from(1)));
        assert_eq!(queue.pop(), Some(NodeId::from(1)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn forget_removes_requests_for_node() {
        let queue = TriggerQueue::new(false);
        queue.push(NodeId::from(1));
        queue.push(NodeId::from(2));
        queue.push(NodeId::from(1));

        queue.forget(NodeId::from(1));
        assert_eq!(queue.drain(), vec![NodeId::from(2)]);
    }

    #[test]
    fn handle_outliving_queue_is_inert() {
        let queue = TriggerQueue::new(true);
        let handle = queue.handle(NodeId::from(3));
        drop(queue);

        assert!(!handle.request());
        assert_eq!(handle.node_id(), NodeId::from(3));
    }

    #[test]
    fn handles_work_across_threads() {
        let queue = TriggerQueue::new(true);
        let handle = queue.handle(NodeId::from(5));

        std::thread::spawn(move || {
            handle.request();
        })
        .join()
        .unwrap();

        assert_eq!(queue.pop(), Some(NodeId::from(5)));
    }
}
