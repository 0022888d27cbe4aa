//! This module defines numeric functions.

use num::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub};

use crate::datavalues::{DataValue, Double};

use super::{BinaryFunction, UnaryFunction};

/// Numeric value
///
/// Types in this enum allow for numeric operations to be performed on them
#[derive(Debug, Clone, Copy)]
pub(crate) enum NumericValue {
    Integer(i64),
    Double(Double),
}

impl NumericValue {
    pub(crate) fn from_datavalue(value: &DataValue) -> Option<NumericValue> {
        match value {
            DataValue::Integer(integer) => Some(NumericValue::Integer(*integer)),
            DataValue::Double(double) => Some(NumericValue::Double(*double)),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn to_double(self) -> Option<Double> {
        match self {
            NumericValue::Integer(integer) => Double::new(integer as f64).ok(),
            NumericValue::Double(double) => Some(double),
        }
    }
}

impl From<NumericValue> for DataValue {
    fn from(value: NumericValue) -> Self {
        match value {
            NumericValue::Integer(integer) => DataValue::Integer(integer),
            NumericValue::Double(double) => DataValue::Double(double),
        }
    }
}

/// Pair of numeric values that have been promoted to a common type
#[derive(Debug, Clone, Copy)]
pub(crate) enum NumericPair {
    Integer(i64, i64),
    Double(Double, Double),
}

impl NumericPair {
    /// Promote two numeric values to a common type.
    ///
    /// If one of the values is a double, both are treated as doubles.
    pub(crate) fn promote(first: NumericValue, second: NumericValue) -> Option<NumericPair> {
        match (first, second) {
            (NumericValue::Integer(first), NumericValue::Integer(second)) => {
                Some(NumericPair::Integer(first, second))
            }
            (first, second) => Some(NumericPair::Double(first.to_double()?, second.to_double()?)),
        }
    }

    fn from_datavalues(first: &DataValue, second: &DataValue) -> Option<NumericPair> {
        Self::promote(
            NumericValue::from_datavalue(first)?,
            NumericValue::from_datavalue(second)?,
        )
    }
}

/// Addition of numeric values
///
/// Returns the sum of the given parameters.
/// Returns `None` if the result cannot be represented.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericAddition;
impl BinaryFunction for NumericAddition {
    fn evaluate(&self, parameter_first: DataValue, parameter_second: DataValue) -> Option<DataValue> {
        match NumericPair::from_datavalues(&parameter_first, &parameter_second)? {
            NumericPair::Integer(first, second) => first.checked_add(second).map(DataValue::from),
            NumericPair::Double(first, second) => first.checked_add(&second).map(DataValue::from),
        }
    }
}

/// Subtraction of numeric values
///
/// Returns the difference between the first and the second parameter.
/// Returns `None` if the result cannot be represented.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericSubtraction;
impl BinaryFunction for NumericSubtraction {
    fn evaluate(&self, parameter_first: DataValue, parameter_second: DataValue) -> Option<DataValue> {
        match NumericPair::from_datavalues(&parameter_first, &parameter_second)? {
            NumericPair::Integer(first, second) => first.checked_sub(second).map(DataValue::from),
            NumericPair::Double(first, second) => first.checked_sub(&second).map(DataValue::from),
        }
    }
}

/// Multiplication of numeric values
///
/// Returns the product of the given parameters.
/// Returns `None` if the result cannot be represented.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericMultiplication;
impl BinaryFunction for NumericMultiplication {
    fn evaluate(&self, parameter_first: DataValue, parameter_second: DataValue) -> Option<DataValue> {
        match NumericPair::from_datavalues(&parameter_first, &parameter_second)? {
            NumericPair::Integer(first, second) => first.checked_mul(second).map(DataValue::from),
            NumericPair::Double(first, second) => first.checked_mul(&second).map(DataValue::from),
        }
    }
}

/// Division of numeric values
///
/// Returns the quotient of the first and the second parameter.
/// Integer division truncates towards zero.
/// Returns `None` if the second parameter is zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericDivision;
impl BinaryFunction for NumericDivision {
    fn evaluate(&self, parameter_first: DataValue, parameter_second: DataValue) -> Option<DataValue> {
        match NumericPair::from_datavalues(&parameter_first, &parameter_second)? {
            NumericPair::Integer(first, second) => first.checked_div(second).map(DataValue::from),
            NumericPair::Double(first, second) => first.checked_div(&second).map(DataValue::from),
        }
    }
}

/// Remainder of the division of numeric values
///
/// Returns the remainder of the first parameter divided by the second,
/// carrying the sign of the first parameter.
/// Returns `None` if the second parameter is zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericRemainder;
impl BinaryFunction for NumericRemainder {
    fn evaluate(&self, parameter_first: DataValue, parameter_second: DataValue) -> Option<DataValue> {
        match NumericPair::from_datavalues(&parameter_first, &parameter_second)? {
            NumericPair::Integer(first, second) => first.checked_rem(second).map(DataValue::from),
            NumericPair::Double(first, second) => first.checked_rem(&second).map(DataValue::from),
        }
    }
}

/// Additive inverse of a numeric value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericNegation;
impl UnaryFunction for NumericNegation {
    fn evaluate(&self, parameter: DataValue) -> Option<DataValue> {
        match NumericValue::from_datavalue(&parameter)? {
            NumericValue::Integer(integer) => integer.checked_neg().map(DataValue::from),
            NumericValue::Double(double) => Double::new(-double.value()).ok().map(DataValue::from),
        }
    }
}

/// Absolute value of a numeric value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NumericAbsolute;
impl UnaryFunction for NumericAbsolute {
    fn evaluate(&self, parameter: DataValue) -> Option<DataValue> {
        match NumericValue::from_datavalue(&parameter)? {
            NumericValue::Integer(integer) => integer.checked_abs().map(DataValue::from),
            NumericValue::Double(double) => Some(DataValue::Double(double.abs())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{NumericAddition, NumericDivision, NumericRemainder};
    use crate::{datavalues::DataValue, function::definitions::BinaryFunction};
    use test_log::test;

    #[test]
    fn addition_promotes_to_double() {
        assert_eq!(
            NumericAddition.evaluate(DataValue::Integer(1), DataValue::double(0.5)),
            Some(DataValue::double(1.5))
        );
        assert_eq!(
            NumericAddition.evaluate(DataValue::Integer(i64::MAX), DataValue::Integer(1)),
            None
        );
    }

    #[test]
    fn remainder_and_division_by_zero() {
        assert_eq!(
            NumericRemainder.evaluate(DataValue::Integer(7), DataValue::Integer(2)),
            Some(DataValue::Integer(1))
        );
        assert_eq!(
            NumericRemainder.evaluate(DataValue::Integer(-7), DataValue::Integer(2)),
            Some(DataValue::Integer(-1))
        );
        assert_eq!(
            NumericDivision.evaluate(DataValue::Integer(7), DataValue::Integer(0)),
            None
        );
        assert_eq!(
            NumericDivision.evaluate(DataValue::double(1.0), DataValue::double(0.0)),
            None
        );
    }
}
