//! This module contains the built-in accumulators,
//! which determine how the values of a group are combined into a single output value.
//!
//! New aggregate kinds are added by implementing [Accumulator],
//! adding a variant to [AccumulatorT] and an entry to
//! [AggregateOperation][super::operation::AggregateOperation].

pub mod average;
pub mod count;
pub mod count_distinct;
pub mod max;
pub mod min;
pub mod sum;

use std::cmp::Ordering;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::{
    datavalues::DataValue,
    error::Error,
    function::definitions::numeric::{NumericPair, NumericValue},
    management::bytesized::ByteSized,
};

use self::{
    average::AverageAccumulator, count::CountAccumulator,
    count_distinct::CountDistinctAccumulator, max::MaxAccumulator, min::MinAccumulator,
    sum::SumAccumulator,
};

use super::operation::AggregateOperation;

/// Running state of one aggregate function for one group
///
/// Every accumulator starts in the zero state returned by
/// [AggregateOperation::create_accumulator].
/// Merging is commutative and associative:
/// merging the states of accumulators that saw disjoint parts of the input
/// is the same as updating one accumulator with all of it.
#[enum_dispatch]
pub trait Accumulator {
    /// Returns the aggregate operation this accumulator computes.
    fn operation(&self) -> AggregateOperation;

    /// Processes one input value and updates the internal state.
    fn update(&mut self, value: &DataValue) -> Result<(), Error>;

    /// Returns the intermediate state of this accumulator.
    ///
    /// The state consists of exactly [AggregateOperation::state_width] values.
    fn state(&self) -> Vec<DataValue>;

    /// Absorbs an intermediate state as returned by [Accumulator::state]
    /// of an accumulator of the same operation.
    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error>;

    /// Returns the resulting aggregated value of all the processed input values.
    ///
    /// This does not modify the state, so calling it repeatedly returns the same value.
    fn evaluate(&self) -> DataValue;

    /// Absorbs the entire state of another accumulator,
    /// as if every value it processed had been passed to [Accumulator::update].
    ///
    /// # Errors
    /// Returns [Error::AccumulatorMismatch] if `other` computes a different operation.
    fn merge(&mut self, other: &AccumulatorT) -> Result<(), Error> {
        if other.operation() != self.operation() {
            return Err(Error::AccumulatorMismatch {
                expected: self.operation(),
                found: other.operation(),
            });
        }

        self.merge_state(&other.state())
    }
}

/// Enum containing all implementations of [Accumulator]
#[allow(missing_docs)]
#[enum_dispatch(Accumulator)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccumulatorT {
    CountAccumulator,
    SumAccumulator,
    AverageAccumulator,
    MinAccumulator,
    MaxAccumulator,
    CountDistinctAccumulator,
}

impl ByteSized for AccumulatorT {
    fn size_bytes(&self) -> u64 {
        match self {
            AccumulatorT::CountAccumulator(accumulator) => accumulator.size_bytes(),
            AccumulatorT::SumAccumulator(accumulator) => accumulator.size_bytes(),
            AccumulatorT::AverageAccumulator(accumulator) => accumulator.size_bytes(),
            AccumulatorT::MinAccumulator(accumulator) => accumulator.size_bytes(),
            AccumulatorT::MaxAccumulator(accumulator) => accumulator.size_bytes(),
            AccumulatorT::CountDistinctAccumulator(accumulator) => accumulator.size_bytes(),
        }
    }
}

/// Order in which [MinAccumulator] and [MaxAccumulator] rank their inputs
///
/// Integers and doubles are compared by numeric value.
/// Numerically equal values of different type, as well as all non-numeric values,
/// are ranked by the order of [DataValue].
pub(crate) fn compare_values(first: &DataValue, second: &DataValue) -> Ordering {
    let numeric = match (
        NumericValue::from_datavalue(first),
        NumericValue::from_datavalue(second),
    ) {
        (Some(first), Some(second)) => match NumericPair::promote(first, second) {
            Some(NumericPair::Integer(first, second)) => first.cmp(&second),
            Some(NumericPair::Double(first, second)) => first.cmp(&second),
            None => Ordering::Equal,
        },
        _ => Ordering::Equal,
    };

    numeric.then_with(|| first.cmp(second))
}

/// Returns the single value of an intermediate state of width one.
pub(crate) fn single_state_value(
    operation: AggregateOperation,
    state: &[DataValue],
) -> Result<&DataValue, Error> {
    match state {
        [value] => Ok(value),
        _ => Err(malformed_state(operation, state)),
    }
}

/// Creates an [Error::MalformedState] for the given state.
pub(crate) fn malformed_state(operation: AggregateOperation, state: &[DataValue]) -> Error {
    Error::MalformedState {
        operation,
        state: DataValue::List(state.to_vec()).to_string(),
    }
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;
    use test_log::test;

    use super::{Accumulator, AccumulatorT};
    use crate::{
        aggregates::operation::AggregateOperation,
        datavalues::{DataValue, Double},
        error::Error,
    };

    const ALL: [AggregateOperation; 7] = [
        AggregateOperation::CountStar,
        AggregateOperation::Count,
        AggregateOperation::Sum,
        AggregateOperation::Average,
        AggregateOperation::Min,
        AggregateOperation::Max,
        AggregateOperation::CountDistinct,
    ];

    fn accumulate(operation: AggregateOperation, values: &[DataValue]) -> AccumulatorT {
        let mut accumulator = operation.create_accumulator();
        for value in values {
            accumulator
                .update(value)
                .expect("test inputs do not overflow");
        }
        accumulator
    }

    fn to_values(values: &[Option<i32>]) -> Vec<DataValue> {
        values
            .iter()
            .map(|value| value.map_or(DataValue::Null, |value| DataValue::Integer(value.into())))
            .collect()
    }

    /// Merging accumulators over arbitrary splits of the input
    /// gives the same result as accumulating all input at once.
    #[quickcheck]
    #[cfg_attr(miri, ignore)]
    fn merge_equals_single_pass(values: Vec<Option<i32>>, splits: Vec<usize>) -> bool {
        let values = to_values(&values);

        let mut boundaries = splits
            .iter()
            .map(|split| split % (values.len() + 1))
            .collect::<Vec<_>>();
        boundaries.push(0);
        boundaries.push(values.len());
        boundaries.sort_unstable();

        for operation in ALL {
            let expected = accumulate(operation, &values).evaluate();

            let mut merged = operation.create_accumulator();
            for window in boundaries.windows(2) {
                let part = accumulate(operation, &values[window[0]..window[1]]);
                merged.merge(&part).expect("same operation");
            }

            if merged.evaluate() != expected {
                log::debug!("{operation:?} differs on {values:?} split at {boundaries:?}");
                return false;
            }
        }

        true
    }

    /// Floating point sums merged in a different order stay within a small tolerance.
    #[quickcheck]
    #[cfg_attr(miri, ignore)]
    fn merge_double_average(values: Vec<Double>) -> bool {
        let values = values
            .into_iter()
            .filter(|value| value.value().abs() < 1e6)
            .map(DataValue::Double)
            .collect::<Vec<_>>();

        let expected = accumulate(AggregateOperation::Average, &values).evaluate();
        let middle = values.len() / 2;
        let mut merged = accumulate(AggregateOperation::Average, &values[middle..]);
        merged
            .merge(&accumulate(AggregateOperation::Average, &values[..middle]))
            .expect("same operation");

        match (expected.as_f64(), merged.evaluate().as_f64()) {
            (Some(expected), Some(merged)) => (expected - merged).abs() <= 1e-6 * expected.abs().max(1.0),
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn evaluate_is_idempotent() {
        let values = to_values(&[Some(3), None, Some(1), Some(3)]);

        for operation in ALL {
            let accumulator = accumulate(operation, &values);
            assert_eq!(accumulator.evaluate(), accumulator.evaluate());
        }
    }

    #[test]
    fn zero_states() {
        let expected = [
            DataValue::Integer(0),
            DataValue::Integer(0),
            DataValue::Null,
            DataValue::Null,
            DataValue::Null,
            DataValue::Null,
            DataValue::Integer(0),
        ];

        for (operation, expected) in ALL.into_iter().zip(expected) {
            assert_eq!(operation.create_accumulator().evaluate(), expected);
        }
    }

    #[test]
    fn null_handling() {
        let values = to_values(&[Some(4), None, Some(4), Some(1)]);
        let results = ALL.map(|operation| accumulate(operation, &values).evaluate());

        assert_eq!(
            results,
            [
                DataValue::Integer(4),
                DataValue::Integer(3),
                DataValue::Integer(9),
                DataValue::double(3.0),
                DataValue::Integer(1),
                DataValue::Integer(4),
                DataValue::Integer(2),
            ]
        );
    }

    #[test]
    fn extremes_of_mixed_numbers() {
        let values = [
            DataValue::Integer(10),
            DataValue::double(0.5),
            DataValue::double(2.5),
        ];

        assert_eq!(
            accumulate(AggregateOperation::Min, &values).evaluate(),
            DataValue::double(0.5)
        );
        assert_eq!(
            accumulate(AggregateOperation::Max, &values).evaluate(),
            DataValue::Integer(10)
        );

        let mut merged = accumulate(AggregateOperation::Max, &values[1..]);
        merged
            .merge(&accumulate(AggregateOperation::Max, &values[..1]))
            .expect("same operation");
        assert_eq!(merged.evaluate(), DataValue::Integer(10));
    }

    #[test]
    fn equal_numbers_rank_integers_first() {
        let values = [DataValue::double(1.0), DataValue::Integer(1)];

        assert_eq!(
            accumulate(AggregateOperation::Min, &values).evaluate(),
            DataValue::Integer(1)
        );
        assert_eq!(
            accumulate(AggregateOperation::Max, &values).evaluate(),
            DataValue::double(1.0)
        );
    }

    #[test]
    fn merge_rejects_other_kind() {
        let mut sum = AggregateOperation::Sum.create_accumulator();
        let count = AggregateOperation::Count.create_accumulator();

        assert!(matches!(
            sum.merge(&count),
            Err(Error::AccumulatorMismatch {
                expected: AggregateOperation::Sum,
                found: AggregateOperation::Count
            })
        ));
    }

    #[test]
    fn accumulators_survive_serialization() {
        let values = to_values(&[Some(1), Some(2), Some(2)]);

        for operation in ALL {
            let accumulator = accumulate(operation, &values);
            let serialized = serde_json::to_string(&accumulator).unwrap();
            let restored: AccumulatorT = serde_json::from_str(&serialized).unwrap();

            assert_eq!(restored.evaluate(), accumulator.evaluate());
        }
    }
}
