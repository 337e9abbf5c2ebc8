use crate::node::{Node, NodeInfo, Shape, Slot, SolveContext, SolveError};
use crate::value::{Kind, Value};

/// Concatenates any number of number lists, in input order.
///
/// Inputs are dynamic: the host appends `L1`, `L2`, ... with
/// [`Graph::add_input`](crate::Graph::add_input). An unwired input counts
/// as an empty list.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinList;

impl JoinList {
    pub fn new() -> Self {
        JoinList
    }

    fn list_slot(position: usize) -> Slot {
        Slot::new(format!("List {position}"), format!("L{position}"), Kind::Float)
            .list()
            .with_default(Value::List(Vec::new()))
    }
}

impl Node for JoinList {
    fn type_key(&self) -> &'static str {
        "list.join"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "Join",
            full_name: "Join Lists",
            description: "Join lists into one list",
            group: "Sets",
            subgroup: "List",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(Self::list_slot(0))
            .output(Slot::new("List", "L", Kind::Float).describe("Joined list").list())
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let mut joined = Vec::new();
        for input in inputs {
            joined.extend(input.as_list()?.iter().cloned());
        }
        Ok(vec![Value::List(joined)])
    }

    fn dynamic_input(&self, position: usize) -> Option<Slot> {
        Some(Self::list_slot(position))
    }
}
