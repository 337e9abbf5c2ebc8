//! Slots
//!
//! A slot is a named, typed socket on a node. Input slots receive values
//! from wires (or fall back to their default), output slots publish the
//! values a node computed.

use serde::{Deserialize, Serialize};

use crate::value::{Kind, Value};

/// Stable handle to a slot within one node.
///
/// Handles are never reused by the node that issued them, so removing a slot
/// does not disturb wires attached to any other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// How many values a slot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Exactly one value.
    #[default]
    Item,
    /// Zero or more values, always presented as a `Value::List`.
    List,
}

/// Declaration of a single input or output socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    name: String,
    variable: String,
    #[serde(default)]
    description: String,
    kind: Kind,
    #[serde(default)]
    access: Access,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    optional: bool,
}

impl Slot {
    /// Create an item-access slot with no default.
    pub fn new(name: impl Into<String>, variable: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            variable: variable.into(),
            description: String::new(),
            kind,
            access: Access::Item,
            default: None,
            optional: false,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Switch to list access. The declared kind becomes the element kind.
    pub fn list(mut self) -> Self {
        self.access = Access::List;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Allow this input to resolve to `Null` without failing validation.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn set_default(&mut self, value: Option<Value>) {
        self.default = value;
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// A slot with no default needs a wire to produce a value.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Kind and access compatibility check.
    ///
    /// `Null` is always structurally accepted; whether it is allowed is a
    /// validation concern. List slots require a list whose every element
    /// matches the declared element kind.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self.access {
            Access::Item => self.kind.accepts(value.kind()),
            Access::List => match value {
                Value::List(items) => items.iter().all(|item| self.kind.accepts(item.kind())),
                _ => false,
            },
        }
    }

    /// Whether `value` may stand in as this slot's default.
    ///
    /// A list slot also takes a single element, which [`Slot::resolve`]
    /// wraps into a one-element list.
    pub fn accepts_default(&self, value: &Value) -> bool {
        match (self.access, value) {
            (Access::List, Value::List(_)) => self.accepts(value),
            (Access::List, item) => item.is_null() || self.kind.accepts(item.kind()),
            (Access::Item, _) => self.accepts(value),
        }
    }

    /// Combine the values arriving on this slot's wires into the single value
    /// handed to the node.
    ///
    /// `incoming` must be in wire registration order.
    pub fn resolve(&self, incoming: &[Value]) -> Value {
        match self.access {
            Access::Item => match incoming {
                [single] => single.clone(),
                _ => self.default.clone().unwrap_or_default(),
            },
            Access::List => {
                if incoming.is_empty() {
                    return match &self.default {
                        Some(Value::List(items)) => Value::List(items.clone()),
                        Some(value) => Value::List(vec![value.clone()]),
                        None => Value::Null,
                    };
                }
                let mut items = Vec::with_capacity(incoming.len());
                for value in incoming {
                    match value {
                        Value::List(inner) => items.extend(inner.iter().cloned()),
                        other => items.push(other.clone()),
                    }
                }
                Value::List(items)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_slot_prefers_single_wire_over_default() {
        let slot = Slot::new("X", "X", Kind::Float).with_default(0.0);
        assert_eq!(slot.resolve(&[Value::Float(2.0)]), Value::Float(2.0));
        assert_eq!(slot.resolve(&[]), Value::Float(0.0));
    }

    #[test]
    fn item_slot_without_default_resolves_null() {
        let slot = Slot::new("X", "X", Kind::Float);
        assert!(slot.is_required());
        assert_eq!(slot.resolve(&[]), Value::Null);
    }

    #[test]
    fn list_slot_concatenates_in_order() {
        let slot = Slot::new("L", "L", Kind::Float).list();
        let resolved = slot.resolve(&[
            Value::Float(1.0),
            Value::list([2.0, 3.0]),
            Value::Int(4),
        ]);
        assert_eq!(
            resolved,
            Value::list([Value::Float(1.0), Value::Float(2.0), Value::Float(3.0), Value::Int(4)])
        );
    }

    #[test]
    fn list_slot_wraps_scalar_default() {
        let slot = Slot::new("L", "L", Kind::Float).list().with_default(0.0);
        assert_eq!(slot.resolve(&[]), Value::list([0.0]));

        let listed = Slot::new("L", "L", Kind::Float)
            .list()
            .with_default(Value::list([1.0, 2.0]));
        assert_eq!(listed.resolve(&[]), Value::list([1.0, 2.0]));
    }

    #[test]
    fn accepts_checks_kind_and_access() {
        let item = Slot::new("X", "X", Kind::Float);
        assert!(item.accepts(&Value::Int(1)));
        assert!(item.accepts(&Value::Null));
        assert!(!item.accepts(&Value::from("one")));
        assert!(!item.accepts(&Value::list([1.0])));

        let list = Slot::new("L", "L", Kind::Float).list();
        assert!(list.accepts(&Value::list([1.0, 2.0])));
        assert!(list.accepts(&Value::list([Value::Int(1)])));
        assert!(!list.accepts(&Value::Float(1.0)));
        assert!(!list.accepts(&Value::list([Value::Bool(true)])));
    }

    #[test]
    fn list_default_may_be_single_element() {
        let list = Slot::new("L", "L", Kind::Float).list().with_default(0.0);
        let declared = list.default_value().cloned().unwrap();
        assert!(list.accepts_default(&declared));
        assert!(list.accepts_default(&Value::Int(2)));
        assert!(list.accepts_default(&Value::list([1.0, 2.0])));
        assert!(!list.accepts_default(&Value::from("one")));
        assert!(!list.accepts_default(&Value::list([Value::Bool(true)])));

        let item = Slot::new("X", "X", Kind::Float);
        assert!(!item.accepts_default(&Value::list([1.0])));
    }
}
