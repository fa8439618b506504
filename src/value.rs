use serde::Deserialize;

use crate::wire;

/// Storage type tag the service attaches to every returned cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Binary,
    Image,
    Null,
    Text,
    Integer,
    Float,
}

impl TryFrom<i64> for ValueType {
    type Error = i64;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Binary),
            1 => Ok(Self::Image),
            2 => Ok(Self::Null),
            3 => Ok(Self::Text),
            4 => Ok(Self::Integer),
            5 => Ok(Self::Float),
            other => Err(other),
        }
    }
}

/// Payload of a BLOB cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Blob {
    /// Raw bytes carried as a character string, the form the service uses.
    Text(String),
    /// The service sent something other than a string; holds the JSON kind.
    Unexpected(&'static str),
}

/// A single typed cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Binary(Blob),
    Image,
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    /// Scalar cell kept as the service's text, because its payload did not
    /// re-render unchanged from the tagged type (e.g. `"3.1400"` for a float).
    Verbatim { kind: ValueType, text: String },
    /// Cell with a type tag outside the known set.
    Unknown(i64),
}

impl Value {
    /// Returns the cell's type tag, or `None` for an unknown tag.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Binary(_) => Some(ValueType::Binary),
            Self::Image => Some(ValueType::Image),
            Self::Null => Some(ValueType::Null),
            Self::Text(_) => Some(ValueType::Text),
            Self::Integer(_) => Some(ValueType::Integer),
            Self::Float(_) => Some(ValueType::Float),
            Self::Verbatim { kind, .. } => Some(*kind),
            Self::Unknown(_) => None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn blob(value: impl Into<String>) -> Self {
        Self::Binary(Blob::Text(value.into()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A named cell as returned by the service.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "wire::RawDataValue")]
pub struct DataValue {
    /// Column name.
    pub name: String,
    pub value: Value,
}

impl DataValue {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One row of typed cells, in column order.
pub type DataRow = Vec<DataValue>;
