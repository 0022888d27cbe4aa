//! Computes the sum of all input values.

use serde::{Deserialize, Serialize};

use crate::{
    aggregates::operation::AggregateOperation,
    datavalues::DataValue,
    error::Error,
    function::definitions::numeric::{NumericPair, NumericValue},
    management::bytesized::ByteSized,
};

use super::{single_state_value, Accumulator};

/// Adds `value` to the running sum `current`.
///
/// `NULL` values are ignored and a `NULL` running sum is treated as empty.
/// Integer sums are exact and fail on overflow;
/// as soon as a double is involved, the sum continues as a double.
///
/// Overflow is checked on every running sum, not only the final one,
/// so the order of additions decides whether an input with large intermediate sums fails.
pub(crate) fn add_numeric(
    operation: AggregateOperation,
    current: &DataValue,
    value: &DataValue,
) -> Result<DataValue, Error> {
    if value.is_null() {
        return Ok(current.clone());
    }

    let value_numeric =
        NumericValue::from_datavalue(value).ok_or_else(|| Error::NonNumericAggregateInput {
            operation,
            value: value.to_string(),
        })?;

    if current.is_null() {
        return Ok(value_numeric.into());
    }

    let current_numeric =
        NumericValue::from_datavalue(current).ok_or_else(|| Error::NonNumericAggregateInput {
            operation,
            value: current.to_string(),
        })?;

    match NumericPair::promote(current_numeric, value_numeric) {
        Some(NumericPair::Integer(first, second)) => first
            .checked_add(second)
            .map(DataValue::from)
            .ok_or(Error::IntegerOverflow(operation)),
        Some(NumericPair::Double(first, second)) => num::CheckedAdd::checked_add(&first, &second)
            .map(DataValue::from)
            .ok_or(Error::NonFiniteAggregate(operation)),
        None => Err(Error::NonFiniteAggregate(operation)),
    }
}

/// Sums up all non-null input values; the sum of no values is `NULL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumAccumulator {
    current_sum: DataValue,
}

impl SumAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            current_sum: DataValue::Null,
        }
    }
}

impl Accumulator for SumAccumulator {
    fn operation(&self) -> AggregateOperation {
        AggregateOperation::Sum
    }

    fn update(&mut self, value: &DataValue) -> Result<(), Error> {
        self.current_sum = add_numeric(AggregateOperation::Sum, &self.current_sum, value)?;
        Ok(())
    }

    fn state(&self) -> Vec<DataValue> {
        vec![self.current_sum.clone()]
    }

    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error> {
        let partial_sum = single_state_value(self.operation(), state)?;
        self.update(partial_sum)
    }

    fn evaluate(&self) -> DataValue {
        self.current_sum.clone()
    }
}

impl ByteSized for SumAccumulator {
    fn size_bytes(&self) -> u64 {
        self.current_sum.size_bytes()
    }
}

#[cfg(test)]
mod test {
    use super::SumAccumulator;
    use crate::{aggregates::accumulators::Accumulator, datavalues::DataValue, error::Error};
    use test_log::test;

    #[test]
    fn promotes_to_double() {
        let mut sum = SumAccumulator::new();

        sum.update(&DataValue::Integer(1)).unwrap();
        sum.update(&DataValue::double(0.5)).unwrap();
        sum.update(&DataValue::Integer(2)).unwrap();

        assert_eq!(sum.evaluate(), DataValue::double(3.5));
    }

    #[test]
    fn overflow_is_an_error() {
        let mut sum = SumAccumulator::new();

        sum.update(&DataValue::Integer(i64::MAX)).unwrap();

        assert!(matches!(
            sum.update(&DataValue::Integer(1)),
            Err(Error::IntegerOverflow(_))
        ));
    }

    #[test]
    fn double_overflow_is_not_finite() {
        let mut sum = SumAccumulator::new();

        sum.update(&DataValue::double(f64::MAX)).unwrap();

        assert!(matches!(
            sum.update(&DataValue::double(f64::MAX)),
            Err(Error::NonFiniteAggregate(_))
        ));
    }

    #[test]
    fn overflow_is_checked_on_running_sums() {
        let sum_in_order = |values: [i64; 3]| {
            let mut sum = SumAccumulator::new();
            values
                .into_iter()
                .try_for_each(|value| sum.update(&DataValue::Integer(value)))
                .map(|_| sum.evaluate())
        };

        assert!(matches!(
            sum_in_order([i64::MAX, 1, -1]),
            Err(Error::IntegerOverflow(_))
        ));
        assert_eq!(
            sum_in_order([1, -1, i64::MAX]).unwrap(),
            DataValue::Integer(i64::MAX)
        );
    }

    #[test]
    fn strings_are_rejected() {
        let mut sum = SumAccumulator::new();

        assert!(matches!(
            sum.update(&DataValue::string("ten")),
            Err(Error::NonNumericAggregateInput { .. })
        ));
    }
}
