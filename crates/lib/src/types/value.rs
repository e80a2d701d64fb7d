//! Value types stored in documents.
//!
//! Documents hold two kinds of values:
//!
//! - **Objects** ([`ObjType`]): maps, lists and text, each with its own
//!   [`ObjId`] and history of edits.
//! - **Scalars** ([`ScalarValue`]): primitives and counters, stored inline in
//!   a map property or list element.
//!
//! Readers get a [`Value`], which is either a reference to an object or a
//! scalar.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::ObjId;

/// The kind of a non-primitive object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjType {
    /// String-keyed map
    Map,
    /// Ordered list of values
    List,
    /// Ordered sequence of characters
    Text,
}

impl ObjType {
    /// Returns true for lists and text.
    pub fn is_sequence(&self) -> bool {
        matches!(self, ObjType::List | ObjType::Text)
    }

    /// Lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ObjType::Map => "map",
            ObjType::List => "list",
            ObjType::Text => "text",
        }
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive values and counters.
///
/// `F64` must be finite; documents reject NaN and infinities because they
/// have no canonical encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Finite floating point number
    F64(f64),
    /// Immutable string (use a text object for collaborative editing)
    Str(String),
    /// Raw bytes
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    /// Counter; concurrent increments are summed on merge
    Counter(i64),
}

impl ScalarValue {
    /// Lowercase name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "null",
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Int(_) => "int",
            ScalarValue::Uint(_) => "uint",
            ScalarValue::F64(_) => "f64",
            ScalarValue::Str(_) => "str",
            ScalarValue::Bytes(_) => "bytes",
            ScalarValue::Timestamp(_) => "timestamp",
            ScalarValue::Counter(_) => "counter",
        }
    }

    /// Returns true for counters.
    pub fn is_counter(&self) -> bool {
        matches!(self, ScalarValue::Counter(_))
    }

    /// Returns false for NaN or infinite floats.
    pub fn is_finite(&self) -> bool {
        match self {
            ScalarValue::F64(f) => f.is_finite(),
            _ => true,
        }
    }

    /// Creates a counter with the given starting value.
    pub fn counter(start: i64) -> Self {
        ScalarValue::Counter(start)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int(i) => write!(f, "{i}"),
            ScalarValue::Uint(u) => write!(f, "{u}"),
            ScalarValue::F64(x) => write!(f, "{x}"),
            ScalarValue::Str(s) => write!(f, "\"{s}\""),
            ScalarValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            ScalarValue::Timestamp(t) => write!(f, "Timestamp({t})"),
            ScalarValue::Counter(c) => write!(f, "Counter({c})"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int(value as i64)
    }
}

impl From<u64> for ScalarValue {
    fn from(value: u64) -> Self {
        ScalarValue::Uint(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::F64(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Str(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Str(value)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(value: Vec<u8>) -> Self {
        ScalarValue::Bytes(value)
    }
}

impl From<()> for ScalarValue {
    fn from(_: ()) -> Self {
        ScalarValue::Null
    }
}

/// A value as seen by readers: an object reference or a scalar.
///
/// ```
/// use amalgam::{ObjType, ReadDoc, ROOT, Document, Value};
///
/// let doc = Document::new()
///     .change(|tx| {
///         tx.put_object(&ROOT, "items", ObjType::List)?;
///         tx.put(&ROOT, "title", "groceries")?;
///         Ok(())
///     })
///     .unwrap();
///
/// let items = doc.get(&ROOT, "items").unwrap().unwrap();
/// assert_eq!(items.obj_type(), Some(ObjType::List));
/// assert!(items.object_id().is_some());
///
/// let title = doc.get(&ROOT, "title").unwrap().unwrap();
/// assert_eq!(title.as_str(), Some("groceries"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A map, list or text object
    Object(ObjType, ObjId),
    /// An inline scalar
    Scalar(ScalarValue),
}

impl Value {
    /// Returns the object ID if this value is an object.
    pub fn object_id(&self) -> Option<&ObjId> {
        match self {
            Value::Object(_, id) => Some(id),
            Value::Scalar(_) => None,
        }
    }

    /// Returns the object type if this value is an object.
    pub fn obj_type(&self) -> Option<ObjType> {
        match self {
            Value::Object(kind, _) => Some(*kind),
            Value::Scalar(_) => None,
        }
    }

    /// Returns the scalar if this value is one.
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Object(..) => None,
        }
    }

    /// Returns true for objects.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(..))
    }

    /// Returns the string if this is a `Str` scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(ScalarValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int` scalar.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Scalar(ScalarValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(ScalarValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the current total if this is a counter.
    pub fn as_counter(&self) -> Option<i64> {
        match self {
            Value::Scalar(ScalarValue::Counter(c)) => Some(*c),
            _ => None,
        }
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Object(kind, _) => kind.name(),
            Value::Scalar(s) => s.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(kind, id) => write!(f, "{kind}({id})"),
            Value::Scalar(s) => write!(f, "{s}"),
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(value: ScalarValue) -> Self {
        Value::Scalar(value)
    }
}

macro_rules! value_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Scalar(value.into())
                }
            }
        )*
    };
}

value_from_scalar!(bool, i64, i32, u64, f64, &str, String, Vec<u8>, ());

// Direct comparisons for ergonomic assertions.
impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversions() {
        assert_eq!(ScalarValue::from(3), ScalarValue::Int(3));
        assert_eq!(ScalarValue::from(3u64), ScalarValue::Uint(3));
        assert_eq!(ScalarValue::from("x"), ScalarValue::Str("x".into()));
        assert_eq!(ScalarValue::from(()), ScalarValue::Null);
        assert!(ScalarValue::counter(0).is_counter());
    }

    #[test]
    fn non_finite_floats_detected() {
        assert!(ScalarValue::F64(1.5).is_finite());
        assert!(!ScalarValue::F64(f64::NAN).is_finite());
        assert!(!ScalarValue::F64(f64::INFINITY).is_finite());
    }

    #[test]
    fn value_accessors() {
        let text: Value = "hello".into();
        assert!(text == "hello");
        assert_eq!(text.as_int(), None);
        assert!(!text.is_object());

        let list = Value::Object(ObjType::List, ObjId::Root);
        assert_eq!(list.obj_type(), Some(ObjType::List));
        assert_eq!(list.object_id(), Some(&ObjId::Root));
        assert_eq!(list.type_name(), "list");

        let counter: Value = ScalarValue::counter(5).into();
        assert_eq!(counter.as_counter(), Some(5));
    }
}
