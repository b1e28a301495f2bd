//! Axis keys and cell values
//!
//! Tables are indexed by [`AxisKey`]s: tuples with one [`Key`] per axis
//! dimension. Cells hold [`Scalar`]s, which are also what every key turns into
//! once it has been formatted for output.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A primitive value: a table cell, or a formatted axis key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&Scalar> for serde_json::Value {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Int(i) => serde_json::Value::from(*i),
            // NaN and infinities have no JSON form
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// Domain objects used as axis keys implement this to provide the text
/// written to every output format.
pub trait CanonicalKey: fmt::Debug + Send + Sync {
    fn canonical(&self) -> String;
}

/// One dimension of an axis key.
#[derive(Debug, Clone)]
pub enum Key {
    Int(i64),
    Float(f64),
    Text(String),
    Object(Arc<dyn CanonicalKey>),
}

impl Key {
    pub fn object(value: impl CanonicalKey + 'static) -> Self {
        Key::Object(Arc::new(value))
    }

    /// The primitive form of this key. Object keys are reduced to their
    /// canonical text with surrounding whitespace removed.
    pub fn to_scalar(&self) -> Scalar {
        match self {
            Key::Int(i) => Scalar::Int(*i),
            Key::Float(f) => Scalar::Float(*f),
            Key::Text(s) => Scalar::Text(s.clone()),
            Key::Object(obj) => Scalar::Text(obj.canonical().trim().to_string()),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => a == b,
            (Key::Float(a), Key::Float(b)) => a.to_bits() == b.to_bits(),
            (Key::Text(a), Key::Text(b)) => a == b,
            (Key::Object(a), Key::Object(b)) => a.canonical() == b.canonical(),
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Key::Int(i) => i.hash(state),
            Key::Float(f) => f.to_bits().hash(state),
            Key::Text(s) => s.hash(state),
            Key::Object(obj) => obj.canonical().hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_scalar(), f)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value.into())
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Key::Float(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

/// A position on a table axis: one [`Key`] per dimension of the axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AxisKey(Vec<Key>);

impl AxisKey {
    pub fn new(parts: Vec<Key>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[Key] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, dim: usize) -> Option<&Key> {
        self.0.get(dim)
    }

    /// The leading `len` dimensions of the key
    pub fn prefix(&self, len: usize) -> &[Key] {
        &self.0[..len.min(self.0.len())]
    }
}

impl fmt::Display for AxisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(part, f)?;
        }
        Ok(())
    }
}

impl From<Key> for AxisKey {
    fn from(value: Key) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<Key>> for AxisKey {
    fn from(value: Vec<Key>) -> Self {
        Self(value)
    }
}

impl From<i64> for AxisKey {
    fn from(value: i64) -> Self {
        Key::from(value).into()
    }
}

impl From<i32> for AxisKey {
    fn from(value: i32) -> Self {
        Key::from(value).into()
    }
}

impl From<f64> for AxisKey {
    fn from(value: f64) -> Self {
        Key::from(value).into()
    }
}

impl From<&str> for AxisKey {
    fn from(value: &str) -> Self {
        Key::from(value).into()
    }
}

impl From<String> for AxisKey {
    fn from(value: String) -> Self {
        Key::from(value).into()
    }
}

impl<A: Into<Key>, B: Into<Key>> From<(A, B)> for AxisKey {
    fn from((a, b): (A, B)) -> Self {
        Self(vec![a.into(), b.into()])
    }
}

impl<A: Into<Key>, B: Into<Key>, C: Into<Key>> From<(A, B, C)> for AxisKey {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self(vec![a.into(), b.into(), c.into()])
    }
}
