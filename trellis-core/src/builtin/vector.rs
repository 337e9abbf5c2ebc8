use super::arg;
use crate::node::{Node, NodeInfo, Shape, Slot, SolveContext, SolveError};
use crate::value::{Kind, Value};

/// Splits a vector into its components.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeconstructVector;

impl Node for DeconstructVector {
    fn type_key(&self) -> &'static str {
        "vector.deconstruct"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "DeVec",
            full_name: "Deconstruct Vector",
            description: "Deconstruct a vector into its components",
            group: "Vector",
            subgroup: "Vector",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(Slot::new("Vector", "V", Kind::Vector3).describe("Vector to deconstruct"))
            .output(Slot::new("X component", "X", Kind::Float))
            .output(Slot::new("Y component", "Y", Kind::Float))
            .output(Slot::new("Z component", "Z", Kind::Float))
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let v = arg(inputs, 0).as_vector3()?;
        Ok(vec![v.x.into(), v.y.into(), v.z.into()])
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::builtin::testing::run;

    #[test]
    fn splits_components() {
        let out = run(&mut DeconstructVector, &[Value::from(DVec3::new(1.0, -2.0, 0.5))]).unwrap();
        assert_eq!(out, vec![Value::Float(1.0), Value::Float(-2.0), Value::Float(0.5)]);
    }

    #[test]
    fn vector_input_is_required() {
        let shape = DeconstructVector.declare();
        assert!(shape.inputs[0].is_required());
        assert!(run(&mut DeconstructVector, &[Value::Null]).is_err());
    }
}
