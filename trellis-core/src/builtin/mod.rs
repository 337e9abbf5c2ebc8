//! Builtin Nodes
//!
//! A small set of ordinary [`Node`](crate::Node) implementations shipped with
//! the engine. They get no special treatment from the graph; hosts register
//! their own node types the same way.
//!
//! | type key              | node                   |
//! |-----------------------|------------------------|
//! | `input.integer`       | [`Constant`]           |
//! | `input.number`        | [`Constant`]           |
//! | `maths.addition`      | [`Addition`]           |
//! | `maths.mass_average`  | [`MassAverage`]        |
//! | `maths.random`        | [`RandomValue`]        |
//! | `curve.polygon`       | [`Polygon`]            |
//! | `vector.deconstruct`  | [`DeconstructVector`]  |
//! | `list.join`           | [`JoinList`]           |
//!
//! [`ButtonListener`] (`input.toggle`) needs a [`ButtonBoard`] from the host,
//! so it is not part of [`Catalog::builtin`].

mod curve;
mod input;
mod list;
mod maths;
mod vector;

pub use curve::Polygon;
pub use input::{ButtonBoard, ButtonListener, Constant};
pub use list::JoinList;
pub use maths::{Addition, MassAverage, RandomValue};
pub use vector::DeconstructVector;

use crate::node::Catalog;
use crate::value::Value;

/// Upper bound on element counts (`N` of [`RandomValue`] and [`Polygon`]).
/// Larger requests leave the node invalid instead of allocating.
pub const MAX_COUNT: i64 = 1 << 20;

/// Register every builtin node type.
pub fn register(catalog: &mut Catalog) {
    catalog
        .register("input.integer", || Box::new(Constant::integer()))
        .register("input.number", || Box::new(Constant::number()))
        .register("maths.addition", || Box::new(Addition))
        .register("maths.mass_average", || Box::new(MassAverage))
        .register("maths.random", || Box::new(RandomValue))
        .register("curve.polygon", || Box::new(Polygon))
        .register("vector.deconstruct", || Box::new(DeconstructVector))
        .register("list.join", || Box::new(JoinList::new()));
}

/// Input `index`, or `Null` past the end.
fn arg(inputs: &[Value], index: usize) -> &Value {
    static NULL: Value = Value::Null;
    inputs.get(index).unwrap_or(&NULL)
}
