//! Values
//!
//! Every datum that flows along a wire is a [`Value`]. The set of kinds is
//! closed: scalars, a few fixed-size math types, an opaque pointer, and two
//! containers (`List` and `Record`).
//!
//! # Null
//!
//! `Value::Null` is the "unset" marker. A slot holding `Null` is treated as
//! invalid regardless of the kind it declares, and a node that fails
//! validation has every output replaced with `Null`.
//!
//! # Access
//!
//! Node implementations read their inputs through the `as_*` accessors.
//! Each accessor fails with [`TypeMismatch`] when the active kind differs.
//! The only implicit conversion is `as_float` accepting an `Int`.

mod kind;

pub use kind::Kind;

use glam::{DAffine3, DQuat, DVec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An opaque handle to something owned by the host (a UI element, a scene
/// object). The engine only compares pointers for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer(u64);

impl Pointer {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// String-keyed composite value. Node implementations use records to model
/// geometry such as polylines or meshes.
pub type Record = IndexMap<String, Value>;

/// A datum flowing on a wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector3(DVec3),
    Quaternion(DQuat),
    Matrix3x4(DAffine3),
    Pointer(Pointer),
    List(Vec<Value>),
    Record(Record),
}

/// Raised when a value is read as a kind it does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("type mismatch: expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: Kind,
    pub found: Kind,
}

impl Value {
    /// Build a list value.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a record value. Later duplicate keys overwrite earlier ones.
    pub fn record<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The active kind.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Vector3(_) => Kind::Vector3,
            Value::Quaternion(_) => Kind::Quaternion,
            Value::Matrix3x4(_) => Kind::Matrix3x4,
            Value::Pointer(_) => Kind::Pointer,
            Value::List(_) => Kind::List,
            Value::Record(_) => Kind::Record,
        }
    }

    /// Whether the active kind is exactly `kind`.
    pub fn is(&self, kind: Kind) -> bool {
        self.kind() == kind
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn mismatch(&self, expected: Kind) -> TypeMismatch {
        TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, TypeMismatch> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch(Kind::Bool)),
        }
    }

    pub fn as_int(&self) -> Result<i64, TypeMismatch> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(other.mismatch(Kind::Int)),
        }
    }

    /// Read a float, widening an `Int` if necessary.
    pub fn as_float(&self) -> Result<f64, TypeMismatch> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(other.mismatch(Kind::Float)),
        }
    }

    pub fn as_str(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch(Kind::String)),
        }
    }

    pub fn as_vector3(&self) -> Result<DVec3, TypeMismatch> {
        match self {
            Value::Vector3(v) => Ok(*v),
            other => Err(other.mismatch(Kind::Vector3)),
        }
    }

    pub fn as_quaternion(&self) -> Result<DQuat, TypeMismatch> {
        match self {
            Value::Quaternion(q) => Ok(*q),
            other => Err(other.mismatch(Kind::Quaternion)),
        }
    }

    pub fn as_matrix3x4(&self) -> Result<DAffine3, TypeMismatch> {
        match self {
            Value::Matrix3x4(m) => Ok(*m),
            other => Err(other.mismatch(Kind::Matrix3x4)),
        }
    }

    pub fn as_pointer(&self) -> Result<Pointer, TypeMismatch> {
        match self {
            Value::Pointer(p) => Ok(*p),
            other => Err(other.mismatch(Kind::Pointer)),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], TypeMismatch> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(other.mismatch(Kind::List)),
        }
    }

    pub fn as_record(&self) -> Result<&Record, TypeMismatch> {
        match self {
            Value::Record(map) => Ok(map),
            other => Err(other.mismatch(Kind::Record)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DVec3> for Value {
    fn from(v: DVec3) -> Self {
        Value::Vector3(v)
    }
}

impl From<DQuat> for Value {
    fn from(q: DQuat) -> Self {
        Value::Quaternion(q)
    }
}

impl From<DAffine3> for Value {
    fn from(m: DAffine3) -> Self {
        Value::Matrix3x4(m)
    }
}

impl From<Pointer> for Value {
    fn from(p: Pointer) -> Self {
        Value::Pointer(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(map: Record) -> Self {
        Value::Record(map)
    }
}
