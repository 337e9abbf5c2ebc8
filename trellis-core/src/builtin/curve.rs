use std::f64::consts::TAU;

use glam::{DAffine3, DVec3};

use super::{arg, MAX_COUNT};
use crate::node::{Node, NodeInfo, Shape, Slot, SolveContext, SolveError, ValidationFailure};
use crate::value::{Kind, Value};

/// Regular polygon with `N` sides on the unit circle in the XY plane,
/// moved by `T`.
///
/// The result is a polyline record: `vertices` (list of vector3) and
/// `closed` (always true).
#[derive(Debug, Clone, Copy, Default)]
pub struct Polygon;

impl Node for Polygon {
    fn type_key(&self) -> &'static str {
        "curve.polygon"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "Polygon",
            full_name: "Construct Polygon",
            description: "Construct a polygon with n sides",
            group: "Mesh",
            subgroup: "Primitive",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(
                Slot::new("Number of sides", "N", Kind::Int)
                    .describe("Number of sides for the polygon")
                    .with_default(5),
            )
            .input(
                Slot::new("Transformation", "T", Kind::Matrix3x4)
                    .describe("Transformation to apply to polygon")
                    .with_default(DAffine3::IDENTITY),
            )
            .output(Slot::new("Polygon", "P", Kind::Record).describe("Constructed polygon"))
    }

    fn validate(&self, inputs: &[Value]) -> Result<(), ValidationFailure> {
        match arg(inputs, 0).as_int() {
            Ok(sides) if sides < 3 => Err(ValidationFailure::rejected("N must be >= 3")),
            Ok(sides) if sides > MAX_COUNT => Err(ValidationFailure::rejected(format!(
                "N must not exceed {MAX_COUNT}"
            ))),
            _ => Ok(()),
        }
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let sides = arg(inputs, 0).as_int()?;
        let transform = arg(inputs, 1).as_matrix3x4()?;

        let step = TAU / sides as f64;
        let vertices = (0..sides).map(|i| {
            let angle = step * i as f64;
            transform.transform_point3(DVec3::new(angle.cos(), angle.sin(), 0.0))
        });

        let polyline = Value::record([
            ("vertices", Value::list(vertices)),
            ("closed", Value::Bool(true)),
        ]);
        Ok(vec![polyline])
    }
}
