//! This module defines [DataValue], the dynamically typed scalar of the execution engine.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::Double;

/// A single value of a row
///
/// Values are totally ordered: first by the rank of their variant
/// (in declaration order), then by the value itself.
/// Consequently, integers and doubles are not compared numerically with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataValue {
    /// SQL `NULL`
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// Finite 64-bit floating point number
    Double(Double),
    /// Character string
    String(String),
    /// Sequence of values, used to transport multi-valued intermediate aggregation state
    List(Vec<DataValue>),
}

impl DataValue {
    /// Create a [DataValue] from a finite [f64].
    ///
    /// Returns [DataValue::Null] if `value` is NaN or infinite.
    pub fn double(value: f64) -> Self {
        Double::new(value).map_or(DataValue::Null, DataValue::Double)
    }

    /// Create a [DataValue::String].
    pub fn string<S: Into<String>>(value: S) -> Self {
        DataValue::String(value.into())
    }

    /// Return whether this value is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Return the numeric content of this value as [f64], if it is a number.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(value) => Some(*value as f64),
            DataValue::Double(value) => Some(value.value()),
            _ => None,
        }
    }

    /// Interpret a lexical value the way untyped input is read:
    /// the empty string is `NULL`, then integers, then finite doubles, `true`/`false`,
    /// and everything else is kept as a string.
    ///
    /// Surrounding whitespace is ignored for all of them.
    pub fn from_lexical(lexical: &str) -> Self {
        let trimmed = lexical.trim();

        if trimmed.is_empty() {
            return DataValue::Null;
        }

        if let Ok(integer) = trimmed.parse::<i64>() {
            return DataValue::Integer(integer);
        }

        if let Ok(double) = trimmed.parse::<f64>() {
            if let Ok(double) = Double::new(double) {
                return DataValue::Double(double);
            }
        }

        match trimmed {
            "true" => DataValue::Boolean(true),
            "false" => DataValue::Boolean(false),
            _ => DataValue::String(trimmed.to_string()),
        }
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl From<Double> for DataValue {
    fn from(value: Double) -> Self {
        DataValue::Double(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "NULL"),
            DataValue::Boolean(value) => write!(f, "{value}"),
            DataValue::Integer(value) => write!(f, "{value}"),
            DataValue::Double(value) => write!(f, "{value}"),
            DataValue::String(value) => write!(f, "{value}"),
            DataValue::List(values) => write!(f, "[{}]", values.iter().join(", ")),
        }
    }
}
