use std::fmt;

use config::shared::ColumnType;

/// A single column value of a generated row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    BigInt(i64),
    Int(i32),
    Text(String),
}

impl Value {
    /// Returns the column type this value can be stored in.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::BigInt(_) => ColumnType::BigInt,
            Value::Int(_) => ColumnType::Int,
            Value::Text(_) => ColumnType::Varchar,
        }
    }

    /// Converts the value to the representation stored in a column of type `column_type`.
    ///
    /// An [`Value::Int`] widens into a bigint column, nothing else converts implicitly. Returns
    /// `None` when the value does not fit.
    pub fn cast(&self, column_type: ColumnType) -> Option<Value> {
        match (self, column_type) {
            (Value::BigInt(_), ColumnType::BigInt)
            | (Value::Int(_), ColumnType::Int)
            | (Value::Text(_), ColumnType::Varchar) => Some(self.clone()),
            (Value::Int(value), ColumnType::BigInt) => Some(Value::BigInt(i64::from(*value))),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::BigInt(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}
