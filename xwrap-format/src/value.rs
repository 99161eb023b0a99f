//! Dynamic values produced by the document serializer

use crate::surrogate::Surrogate;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Error collection contents: key to messages
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// A deserialized (or to-be-wrapped) value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Text
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Record instance
    Record(Record),
    /// Error collection
    Errors(ErrorMap),
    /// Surrogate instance; carries its own unwrap capability
    Surrogate(SurrogateValue),
}

/// Record instance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Record type name
    pub type_name: String,
    /// Field values in declaration order
    pub fields: Vec<(String, Value)>,
}

impl Record {
    /// Field value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Replace or append a field value
    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Value {
    /// Short shape name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Errors(_) => "error collection",
            Value::Surrogate(_) => "surrogate",
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow list elements
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the surrogate instance
    pub fn as_surrogate(&self) -> Option<&dyn Surrogate> {
        match self {
            Value::Surrogate(surrogate) => Some(&**surrogate),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i32(*i),
            Value::Long(l) => serializer.serialize_i64(*l),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Record(record) => {
                let mut map = serializer.serialize_map(Some(record.fields.len()))?;
                for (name, value) in &record.fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Value::Errors(errors) => errors.serialize(serializer),
            Value::Surrogate(surrogate) => surrogate.declared_value().serialize(serializer),
        }
    }
}

/// Owned surrogate instance stored inside a [`Value`]
pub struct SurrogateValue(Box<dyn Surrogate>);

impl SurrogateValue {
    /// Take ownership of a surrogate instance
    pub fn new(inner: Box<dyn Surrogate>) -> Self {
        Self(inner)
    }

    /// Release the boxed instance
    pub fn into_inner(self) -> Box<dyn Surrogate> {
        self.0
    }
}

impl Deref for SurrogateValue {
    type Target = dyn Surrogate;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl DerefMut for SurrogateValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Clone for SurrogateValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl PartialEq for SurrogateValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_desc() == other.0.type_desc()
            && self.0.declared_value() == other.0.declared_value()
    }
}

impl fmt::Debug for SurrogateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
