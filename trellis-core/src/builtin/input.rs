//! Input Nodes
//!
//! Nodes whose value comes from outside the graph: a constant the user
//! edits in place, or a toggle button living in the host's UI.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::arg;
use crate::graph::NodeId;
use crate::node::{Node, NodeInfo, Shape, Slot, SolveContext, SolveError, ValidationFailure};
use crate::trigger::TriggerHandle;
use crate::value::{Kind, Pointer, Value};

/// Publishes the value of its single input.
///
/// The input is never wired in practice: the host edits its default with
/// [`Graph::set_default`](crate::Graph::set_default) and quick-solves from
/// the node.
#[derive(Debug, Clone)]
pub struct Constant {
    initial: Value,
}

impl Constant {
    /// A constant starting at `initial`. Its kind fixes the slot kind.
    pub fn new(initial: impl Into<Value>) -> Self {
        Self {
            initial: initial.into(),
        }
    }

    pub fn integer() -> Self {
        Self::new(0)
    }

    pub fn number() -> Self {
        Self::new(0.0)
    }
}

impl Node for Constant {
    fn type_key(&self) -> &'static str {
        match self.initial.kind() {
            Kind::Int => "input.integer",
            Kind::Float => "input.number",
            _ => "input.constant",
        }
    }

    fn info(&self) -> NodeInfo {
        let (name, full_name) = match self.initial.kind() {
            Kind::Int => ("Integer", "Integer Input"),
            Kind::Float => ("Number", "Number Input"),
            _ => ("Constant", "Constant Input"),
        };
        NodeInfo {
            name,
            full_name,
            description: "A value edited in place",
            group: "Input",
            subgroup: "Primitive",
        }
    }

    fn declare(&self) -> Shape {
        let kind = self.initial.kind();
        Shape::new()
            .input(Slot::new("Value", "V", kind).with_default(self.initial.clone()))
            .output(Slot::new("Value", "V", kind))
    }

    fn solve(&mut self, inputs: &[Value], _ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        Ok(vec![arg(inputs, 0).clone()])
    }
}

#[derive(Debug, Default)]
struct Button {
    selected: bool,
    listeners: IndexMap<NodeId, TriggerHandle>,
}

#[derive(Debug, Default)]
struct Board {
    next: u64,
    buttons: IndexMap<Pointer, Button>,
}

/// Host-side registry of toggle buttons, shared with the listener nodes.
///
/// Buttons are addressed by [`Pointer`], which is what travels on the
/// listener's `BP` input. Pressing a button flips it and asks every
/// subscribed listener for a re-solve; nothing is solved until the host
/// pumps the graph.
#[derive(Debug, Clone, Default)]
pub struct ButtonBoard {
    inner: Arc<Mutex<Board>>,
}

impl ButtonBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unselected button.
    pub fn add_button(&self) -> Pointer {
        let mut board = self.inner.lock();
        board.next += 1;
        let pointer = Pointer::new(board.next);
        board.buttons.insert(pointer, Button::default());
        pointer
    }

    /// Flip a button and notify its listeners. Returns the new state, or
    /// `None` for an unknown button.
    pub fn press(&self, button: Pointer) -> Option<bool> {
        let (selected, listeners) = {
            let mut board = self.inner.lock();
            let button = board.buttons.get_mut(&button)?;
            button.selected = !button.selected;
            let listeners: Vec<TriggerHandle> = button.listeners.values().cloned().collect();
            (button.selected, listeners)
        };

        for listener in listeners {
            listener.request();
        }
        Some(selected)
    }

    pub fn is_selected(&self, button: Pointer) -> Option<bool> {
        self.inner.lock().buttons.get(&button).map(|b| b.selected)
    }

    pub fn listener_count(&self, button: Pointer) -> usize {
        self.inner
            .lock()
            .buttons
            .get(&button)
            .map_or(0, |b| b.listeners.len())
    }

    /// Returns the button's state, or `None` for an unknown button.
    fn subscribe(&self, button: Pointer, handle: TriggerHandle) -> Option<bool> {
        let mut board = self.inner.lock();
        let button = board.buttons.get_mut(&button)?;
        button.listeners.insert(handle.node_id(), handle);
        Some(button.selected)
    }

    fn unsubscribe(&self, button: Pointer, node: NodeId) {
        if let Some(button) = self.inner.lock().buttons.get_mut(&button) {
            button.listeners.shift_remove(&node);
        }
    }
}

/// Outputs the state of a toggle button and re-solves whenever it is
/// pressed, unless muted.
#[derive(Debug)]
pub struct ButtonListener {
    board: ButtonBoard,
    subscription: Option<(Pointer, NodeId)>,
}

impl ButtonListener {
    pub fn new(board: ButtonBoard) -> Self {
        Self {
            board,
            subscription: None,
        }
    }

    fn release(&mut self) {
        if let Some((button, node)) = self.subscription.take() {
            self.board.unsubscribe(button, node);
        }
    }
}

impl Node for ButtonListener {
    fn type_key(&self) -> &'static str {
        "input.toggle"
    }

    fn info(&self) -> NodeInfo {
        NodeInfo {
            name: "ButtonListener",
            full_name: "Button Listener",
            description: "Listens to a toggle button",
            group: "Input",
            subgroup: "Scene",
        }
    }

    fn declare(&self) -> Shape {
        Shape::new()
            .input(Slot::new("Button Pointers", "BP", Kind::Pointer).describe("Button to listen to"))
            .input(Slot::new("Mute", "M", Kind::Bool).describe("Mute this listener").with_default(false))
            .output(Slot::new("Value", "V", Kind::Bool).describe("Whether the button is selected"))
    }

    fn solve(&mut self, inputs: &[Value], ctx: &SolveContext<'_>) -> Result<Vec<Value>, SolveError> {
        let button = arg(inputs, 0).as_pointer()?;
        let mute = arg(inputs, 1).as_bool()?;

        if self.subscription.is_some_and(|(current, _)| current != button) || mute {
            self.release();
        }

        let selected = if mute {
            self.board.is_selected(button)
        } else {
            let selected = self.board.subscribe(button, ctx.trigger());
            if selected.is_some() {
                self.subscription = Some((button, ctx.node_id()));
            }
            selected
        };

        let selected = selected
            .ok_or_else(|| ValidationFailure::rejected(format!("no button at pointer {}", button.raw())))?;
        Ok(vec![Value::Bool(selected)])
    }

    fn on_remove(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::run;
    use crate::trigger::TriggerQueue;

    #[test]
    fn constant_key_follows_kind() {
        assert_eq!(Constant::integer().type_key(), "input.integer");
        assert_eq!(Constant::number().type_key(), "input.number");
        assert_eq!(Constant::new("text").type_key(), "input.constant");

        let shape = Constant::new(4).declare();
        assert_eq!(shape.inputs[0].default_value(), Some(&Value::Int(4)));
        assert_eq!(shape.outputs[0].kind(), Kind::Int);
    }

    #[test]
    fn constant_passes_value_through() {
        let out = run(&mut Constant::integer(), &[Value::Int(12)]).unwrap();
        assert_eq!(out, vec![Value::Int(12)]);
    }

    #[test]
    fn listener_reads_button_pointers() {
        let shape = ButtonListener::new(ButtonBoard::new()).declare();
        assert_eq!(shape.inputs[0].name(), "Button Pointers");
        assert_eq!(shape.inputs[0].variable(), "BP");
        assert_eq!(shape.inputs[0].kind(), Kind::Pointer);
    }

    #[test]
    fn listener_subscribes_and_reports_state() {
        let board = ButtonBoard::new();
        let button = board.add_button();
        let queue = TriggerQueue::new(true);
        let ctx = SolveContext::new(NodeId::from(4), &queue);
        let mut listener = ButtonListener::new(board.clone());

        let out = listener
            .solve(&[Value::Pointer(button), Value::Bool(false)], &ctx)
            .unwrap();
        assert_eq!(out, vec![Value::Bool(false)]);
        assert_eq!(board.listener_count(button), 1);

        assert_eq!(board.press(button), Some(true));
        assert_eq!(queue.drain(), vec![NodeId::from(4)]);
    }

    #[test]
    fn muted_listener_unsubscribes() {
        let board = ButtonBoard::new();
        let button = board.add_button();
        let queue = TriggerQueue::new(true);
        let ctx = SolveContext::new(NodeId::from(1), &queue);
        let mut listener = ButtonListener::new(board.clone());

        listener
            .solve(&[Value::Pointer(button), Value::Bool(false)], &ctx)
            .unwrap();
        listener
            .solve(&[Value::Pointer(button), Value::Bool(true)], &ctx)
            .unwrap();
        assert_eq!(board.listener_count(button), 0);

        board.press(button);
        assert!(queue.is_empty());
    }

    #[test]
    fn switching_buttons_moves_the_subscription() {
        let board = ButtonBoard::new();
        let first = board.add_button();
        let second = board.add_button();
        let queue = TriggerQueue::new(true);
        let ctx = SolveContext::new(NodeId::from(1), &queue);
        let mut listener = ButtonListener::new(board.clone());

        listener
            .solve(&[Value::Pointer(first), Value::Bool(false)], &ctx)
            .unwrap();
        listener
            .solve(&[Value::Pointer(second), Value::Bool(false)], &ctx)
            .unwrap();
        assert_eq!(board.listener_count(first), 0);
        assert_eq!(board.listener_count(second), 1);

        listener.on_remove();
        assert_eq!(board.listener_count(second), 0);
    }

    #[test]
    fn unknown_button_is_rejected() {
        let board = ButtonBoard::new();
        let mut listener = ButtonListener::new(board);
        let err = run(&mut listener, &[Value::Pointer(Pointer::new(99)), Value::Bool(false)]).unwrap_err();
        assert!(matches!(err, SolveError::Invalid(ValidationFailure::Rejected(_))));
    }
}
