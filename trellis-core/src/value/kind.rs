//! Value Kinds
//!
//! A `Kind` names one variant of [`Value`](super::Value). Slots declare the
//! kind they expect, and wires compare the kinds of their two endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind tag of a [`Value`](super::Value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Vector3,
    Quaternion,
    Matrix3x4,
    Pointer,
    List,
    Record,
}

impl Kind {
    /// Whether a value of kind `found` may be delivered where `self` is
    /// declared.
    ///
    /// Kinds must match exactly, with one exception: an `Int` is accepted
    /// where a `Float` is declared.
    pub fn accepts(self, found: Kind) -> bool {
        self == found || (self == Kind::Float && found == Kind::Int)
    }

    /// Lowercase name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Vector3 => "vector3",
            Kind::Quaternion => "quaternion",
            Kind::Matrix3x4 => "matrix3x4",
            Kind::Pointer => "pointer",
            Kind::List => "list",
            Kind::Record => "record",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
