//! Value and `DataType` definitions for selbind.

use serde::{Deserialize, Serialize};

/// Supported field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Date (stored as days since epoch).
    Date,
}

impl DataType {
    /// Returns the name of the data type as used in SQL syntax.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int64 => "INT",
            DataType::Float64 => "FLOAT",
            DataType::Bool => "BOOL",
            DataType::String => "CHAR",
            DataType::Date => "DATE",
        }
    }

    /// Returns whether this type is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Returns whether values of this type can be compared with values of `other`.
    ///
    /// Numeric types compare with each other; strings compare with dates
    /// because date literals arrive as quoted strings.
    #[must_use]
    pub fn is_comparable_with(&self, other: DataType) -> bool {
        if *self == other {
            return true;
        }
        if self.is_numeric() && other.is_numeric() {
            return true;
        }
        matches!(
            (self, other),
            (DataType::String, DataType::Date) | (DataType::Date, DataType::String)
        )
    }
}

/// Literal value appearing in a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer value.
    Int64(i64),
    /// 64-bit floating point value.
    Float64(f64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    String(String),
    /// Date value (days since Unix epoch).
    Date(i32),
    /// Null value.
    Null,
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the data type of this value, or None for Null.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Bool(_) => Some(DataType::Bool),
            Value::String(_) => Some(DataType::String),
            Value::Date(_) => Some(DataType::Date),
            Value::Null => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{v}'"),
            Value::Date(v) => write!(f, "DATE({v})"),
            Value::Null => f.write_str("NULL"),
        }
    }
}
