//! Trellis Core
//!
//! This crate provides the solver for Trellis dataflow node graphs.
//! It implements:
//!
//! - A closed, typed value model for everything that travels on a wire
//! - The node contract: declared slots, validation and a pure `solve`
//! - A dependency graph with cycle rejection and deterministic ordering
//! - Full and incremental ("quick") solving with early cutoff
//! - A deferred trigger channel for event-driven nodes
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: `Value`, `Kind` and typed accessors
//! - `node`: the `Node` trait, slots and the node catalog
//! - `graph`: nodes, wires, topology and the solve passes
//! - `trigger`: the queue through which nodes request re-solves
//! - `builtin`: a small set of ready-made nodes
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{Graph, Value};
//!
//! let mut graph = Graph::default();
//! let a = graph.add_node("input.integer").unwrap();
//! let b = graph.add_node("input.integer").unwrap();
//! let sum = graph.add_node("maths.addition").unwrap();
//! graph.add_wire(a, 0, sum, 0).unwrap();
//! graph.add_wire(b, 0, sum, 1).unwrap();
//!
//! graph.set_default(a, 0, Value::Int(5)).unwrap();
//! graph.set_default(b, 0, Value::Int(3)).unwrap();
//! graph.full_solve().unwrap();
//! assert_eq!(graph.get_output(sum, 0).unwrap(), Value::Int(8));
//!
//! // Edit one input and re-solve only what depends on it.
//! graph.set_default(a, 0, Value::Int(10)).unwrap();
//! graph.quick_solve(a).unwrap();
//! assert_eq!(graph.get_output(sum, 0).unwrap(), Value::Int(13));
//! ```

pub mod builtin;
pub mod config;
pub mod error;
pub mod graph;
pub mod node;
pub mod trigger;
pub mod value;

pub use config::GraphConfig;
pub use error::{GraphError, Result, Side};
pub use graph::{Diagnostic, Graph, NodeId, SolveReport, SolveState, WireId};
pub use node::{Catalog, Node, NodeInfo, Shape, Slot, SolveContext, SolveError, ValidationFailure};
pub use trigger::TriggerHandle;
pub use value::{Kind, Pointer, Value};
