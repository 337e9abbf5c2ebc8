use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{arg, MAX_COUNT};
use crate::node::{Node, NodeInfo, Shape, Slot, SolveContext, SolveError, ValidationFailure};
use crate::value::{Kind, Value};

/// `S = X + Y`. Two integers add to an integer, anything else to a float.
///
/// Numeric only: vectors, matrices and quaternions are not accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Addition;

impl Node for Addition {
    fn type_key(&self) -> &'static str {
        "maths.addition"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "Add",
            full_name: "Addition",
            description: "Perform addition",
            group: "Maths",
            subgroup: "Operators",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(Slot::new("X", "X", Kind::Float).describe("First addend").with_default(0.0))
            .input(Slot::new("Y", "Y", Kind::Float).describe("Second addend").with_default(0.0))
            .output(Slot::new("Sum", "S", Kind::Float).describe("Sum of inputs"))
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let sum = match (arg(inputs, 0), arg(inputs, 1)) {
            (Value::Int(x), Value::Int(y)) => x
                .checked_add(*y)
                .map(Value::Int)
                .ok_or_else(|| ValidationFailure::rejected("integer overflow"))?,
            (x, y) => Value::Float(x.as_float()? + y.as_float()?),
        };
        Ok(vec![sum])
    }
}

/// Arithmetic mean of a list of numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassAverage;

impl Node for MassAverage {
    fn type_key(&self) -> &'static str {
        "maths.mass_average"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "MassAvg",
            full_name: "Mass Average",
            description: "Average of list of numbers",
            group: "Maths",
            subgroup: "Operators",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(
                Slot::new("List", "L", Kind::Float)
                    .describe("List of floating point values")
                    .list()
                    .with_default(0.0),
            )
            .output(Slot::new("Average", "A", Kind::Float).describe("Average of values"))
    }

    fn validate(&self, inputs: &[Value]) -> Result<(), ValidationFailure> {
        match arg(inputs, 0) {
            Value::List(items) if items.is_empty() => Err(ValidationFailure::rejected("L is empty")),
            _ => Ok(()),
        }
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let items = arg(inputs, 0).as_list()?;
        let mut total = 0.0;
        for item in items {
            total += item.as_float()?;
        }
        Ok(vec![Value::Float(total / items.len() as f64)])
    }
}

/// `N` pseudo-random floats in `[min, max]`. The same seed always yields
/// the same list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomValue;

impl Node for RandomValue {
    fn type_key(&self) -> &'static str {
        "maths.random"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "RandomValue",
            full_name: "Random Value",
            description: "Generates random floats between min and max",
            group: "Maths",
            subgroup: "Operators",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(Slot::new("Min", "min", Kind::Float).describe("Start of range").with_default(0.0))
            .input(Slot::new("Max", "max", Kind::Float).describe("End of range").with_default(1.0))
            .input(Slot::new("Seed", "S", Kind::Int).describe("Generator seed").with_default(1))
            .input(Slot::new("Number", "N", Kind::Int).describe("How many values").with_default(1))
            .output(
                Slot::new("Random values", "R", Kind::Float)
                    .describe("Random floats between min and max")
                    .list(),
            )
    }

    fn validate(&self, inputs: &[Value]) -> Result<(), ValidationFailure> {
        let (Ok(min), Ok(max)) = (arg(inputs, 0).as_float(), arg(inputs, 1).as_float()) else {
            return Ok(());
        };
        if !min.is_finite() || !max.is_finite() {
            return Err(ValidationFailure::rejected("min and max must be finite"));
        }
        if max < min {
            return Err(ValidationFailure::rejected("max must not be smaller than min"));
        }
        match arg(inputs, 3).as_int() {
            Ok(count) if count < 0 => Err(ValidationFailure::rejected("N must not be negative")),
            Ok(count) if count > MAX_COUNT => Err(ValidationFailure::rejected(format!(
                "N must not exceed {MAX_COUNT}"
            ))),
            _ => Ok(()),
        }
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let min = arg(inputs, 0).as_float()?;
        let max = arg(inputs, 1).as_float()?;
        let seed = arg(inputs, 2).as_int()?;
        let count = arg(inputs, 3).as_int()?.max(0);

        let mut rng = StdRng::seed_from_u64(seed as u64);
        let values = (0..count).map(|_| rng.random_range(min..=max));
        Ok(vec![Value::list(values)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::run;

    #[test]
    fn integers_stay_integers() {
        let out = run(&mut Addition, &[Value::Int(5), Value::Int(3)]).unwrap();
        assert_eq!(out, vec![Value::Int(8)]);

        let out = run(&mut Addition, &[Value::Int(5), Value::Float(0.5)]).unwrap();
        assert_eq!(out, vec![Value::Float(5.5)]);
    }

    #[test]
    fn addition_overflow_is_rejected() {
        let err = run(&mut Addition, &[Value::Int(i64::MAX), Value::Int(1)]).unwrap_err();
        assert!(matches!(err, SolveError::Invalid(ValidationFailure::Rejected(_))));
    }

    #[test]
    fn average_of_list() {
        let out = run(&mut MassAverage, &[Value::list([1.0, 2.0, 6.0])]).unwrap();
        assert_eq!(out, vec![Value::Float(3.0)]);

        let err = run(&mut MassAverage, &[Value::List(Vec::new())]).unwrap_err();
        assert!(matches!(err, SolveError::Invalid(_)));
    }

    #[test]
    fn random_values_are_seeded() {
        let inputs = [Value::Float(2.0), Value::Float(4.0), Value::Int(7), Value::Int(5)];
        let first = run(&mut RandomValue, &inputs).unwrap();
        let second = run(&mut RandomValue, &inputs).unwrap();
        assert_eq!(first, second);

        let values = first[0].as_list().unwrap();
        assert_eq!(values.len(), 5);
        for value in values {
            let value = value.as_float().unwrap();
            assert!((2.0..=4.0).contains(&value));
        }
    }

    #[test]
    fn random_range_must_be_ordered() {
        let inputs = [Value::Float(1.0), Value::Float(0.0), Value::Int(1), Value::Int(1)];
        assert!(RandomValue.validate(&inputs).is_err());

        let inputs = [Value::Float(f64::NAN), Value::Float(1.0), Value::Int(1), Value::Int(1)];
        assert!(RandomValue.validate(&inputs).is_err());

        let inputs = [Value::Float(0.0), Value::Float(1.0), Value::Int(1), Value::Int(0)];
        let out = run(&mut RandomValue, &inputs).unwrap();
        assert_eq!(out, vec![Value::List(Vec::new())]);
    }

    #[test]
    fn random_count_is_bounded() {
        let inputs = [Value::Float(0.0), Value::Float(1.0), Value::Int(1), Value::Int(i64::MAX)];
        let err = run(&mut RandomValue, &inputs).unwrap_err();
        assert!(matches!(err, SolveError::Invalid(ValidationFailure::Rejected(_))));

        let inputs = [Value::Float(0.0), Value::Float(1.0), Value::Int(1), Value::Int(MAX_COUNT + 1)];
        assert!(RandomValue.validate(&inputs).is_err());
    }
}
