//! This module defines functions that are applicable to values of any type.

use crate::datavalues::DataValue;

use super::BinaryFunction;

/// Equality
///
/// Returns `true` if both parameters are the same value, `false` otherwise.
/// Comparing with `NULL` is undefined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Equals;
impl BinaryFunction for Equals {
    fn evaluate(&self, parameter_first: DataValue, parameter_second: DataValue) -> Option<DataValue> {
        if parameter_first.is_null() || parameter_second.is_null() {
            return None;
        }

        Some(DataValue::Boolean(parameter_first == parameter_second))
    }
}
