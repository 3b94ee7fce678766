//! value.rs
//! The closed set of values that flow between parameters and relationship functions.

use crate::model::MappingKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failure raised while reading arguments or by a relationship function itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
    #[error("missing argument '{0}'")]
    MissingArgument(String),
    #[error("{0}")]
    Invalid(String),
}

impl ValueError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ValueError::Invalid(msg.into())
    }
}

/// The atomic unit of data in the engine.
///
/// Collections of parameters are materialized as `List` (arrays, time axes) or
/// `Map` (keyed mappings) of the element values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Real(f64),
    /// Produced for exec-info requests (time step, step count).
    Integer(i64),
    /// A categorical tag; one of the declared categories of its parameter.
    Category(String),
    /// An externally defined structured record.
    Record(BTreeMap<String, Value>),
    List(Vec<Value>),
    Map(BTreeMap<MappingKey, Value>),
}

impl Value {
    pub fn category(tag: impl Into<String>) -> Self {
        Value::Category(tag.into())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Real(_) => "real",
            Value::Integer(_) => "integer",
            Value::Category(_) => "category",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch { expected, found: self.kind_name() }
    }

    /// Integers are accepted where a real is expected.
    pub fn as_real(&self) -> Result<f64, ValueError> {
        match self {
            Value::Real(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            other => Err(other.mismatch("real")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Boolean(v) => Ok(*v),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn as_integer(&self) -> Result<i64, ValueError> {
        match self {
            Value::Integer(v) => Ok(*v),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_category(&self) -> Result<&str, ValueError> {
        match self {
            Value::Category(v) => Ok(v),
            other => Err(other.mismatch("category")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], ValueError> {
        match self {
            Value::List(v) => Ok(v),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_map(&self) -> Result<&BTreeMap<MappingKey, Value>, ValueError> {
        match self {
            Value::Map(v) => Ok(v),
            other => Err(other.mismatch("map")),
        }
    }

    pub fn as_record(&self) -> Result<&BTreeMap<String, Value>, ValueError> {
        match self {
            Value::Record(v) => Ok(v),
            other => Err(other.mismatch("record")),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Real(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Boolean(v) }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::Integer(v) }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Value::List(v) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{:.3}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Category(v) => write!(f, "'{}'", v),
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Named argument values handed to a relationship function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn get(&self, name: &str) -> Result<&Value, ValueError> {
        self.values
            .get(name)
            .ok_or_else(|| ValueError::MissingArgument(name.to_string()))
    }

    pub fn real(&self, name: &str) -> Result<f64, ValueError> { self.get(name)?.as_real() }

    pub fn boolean(&self, name: &str) -> Result<bool, ValueError> { self.get(name)?.as_bool() }

    pub fn integer(&self, name: &str) -> Result<i64, ValueError> { self.get(name)?.as_integer() }

    pub fn category(&self, name: &str) -> Result<&str, ValueError> { self.get(name)?.as_category() }

    pub fn list(&self, name: &str) -> Result<&[Value], ValueError> { self.get(name)?.as_list() }

    pub fn map(&self, name: &str) -> Result<&BTreeMap<MappingKey, Value>, ValueError> {
        self.get(name)?.as_map()
    }

    /// Reads a one-dimensional list of reals (e.g. a time-series addressed with `all_time_steps`).
    pub fn reals(&self, name: &str) -> Result<Vec<f64>, ValueError> {
        self.list(name)?.iter().map(Value::as_real).collect()
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
