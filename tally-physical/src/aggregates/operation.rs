//! Exposes supported aggregate operations and allows creating the associated accumulators

use serde::{Deserialize, Serialize};

use super::accumulators::{
    average::AverageAccumulator, count::CountAccumulator,
    count_distinct::CountDistinctAccumulator, max::MaxAccumulator, min::MinAccumulator,
    sum::SumAccumulator, AccumulatorT,
};

/// Aggregate operations supported by the physical layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOperation {
    /// Number of input rows, including rows where the argument is `NULL`
    CountStar,
    /// Number of non-null values
    Count,
    /// Sum of all non-null values
    Sum,
    /// Arithmetic mean of all non-null values
    Average,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Number of distinct non-null values
    CountDistinct,
}

impl AggregateOperation {
    /// Creates a new accumulator in its zero state for the given aggregate operation.
    pub fn create_accumulator(&self) -> AccumulatorT {
        match self {
            AggregateOperation::CountStar => CountAccumulator::new(true).into(),
            AggregateOperation::Count => CountAccumulator::new(false).into(),
            AggregateOperation::Sum => SumAccumulator::new().into(),
            AggregateOperation::Average => AverageAccumulator::new().into(),
            AggregateOperation::Min => MinAccumulator::new().into(),
            AggregateOperation::Max => MaxAccumulator::new().into(),
            AggregateOperation::CountDistinct => CountDistinctAccumulator::new().into(),
        }
    }

    /// Returns whether the aggregate is invariant to being called with the same value multiple times.
    ///
    /// If `true` is returned, duplicates of input rows may be removed before aggregation
    /// without changing the result.
    pub fn idempotent(&self) -> bool {
        match self {
            AggregateOperation::Min
            | AggregateOperation::Max
            | AggregateOperation::CountDistinct => true,
            AggregateOperation::CountStar
            | AggregateOperation::Count
            | AggregateOperation::Sum
            | AggregateOperation::Average => false,
        }
    }

    /// Returns the number of values the intermediate state of this aggregate consists of.
    pub fn state_width(&self) -> usize {
        match self {
            AggregateOperation::Average => 2,
            _ => 1,
        }
    }

    /// Returns the name under which this aggregate is written in queries.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOperation::CountStar | AggregateOperation::Count => "count",
            AggregateOperation::Sum => "sum",
            AggregateOperation::Average => "avg",
            AggregateOperation::Min => "min",
            AggregateOperation::Max => "max",
            AggregateOperation::CountDistinct => "count_distinct",
        }
    }

    /// Returns the aggregate operation with the given name, if there is one.
    ///
    /// `count` resolves to [AggregateOperation::CountStar] if `star` is set
    /// and to [AggregateOperation::Count] otherwise.
    pub fn from_name(name: &str, star: bool) -> Option<Self> {
        Some(match (name.to_ascii_lowercase().as_str(), star) {
            ("count", true) => AggregateOperation::CountStar,
            ("count", false) => AggregateOperation::Count,
            ("sum", false) => AggregateOperation::Sum,
            ("avg", false) | ("average", false) => AggregateOperation::Average,
            ("min", false) => AggregateOperation::Min,
            ("max", false) => AggregateOperation::Max,
            ("count_distinct", false) => AggregateOperation::CountDistinct,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod test {
    use super::AggregateOperation;
    use crate::{aggregates::accumulators::Accumulator, datavalues::DataValue};
    use test_log::test;

    const ALL: [AggregateOperation; 7] = [
        AggregateOperation::CountStar,
        AggregateOperation::Count,
        AggregateOperation::Sum,
        AggregateOperation::Average,
        AggregateOperation::Min,
        AggregateOperation::Max,
        AggregateOperation::CountDistinct,
    ];

    #[test]
    fn accumulators_match_operation() {
        for operation in ALL {
            let accumulator = operation.create_accumulator();

            assert_eq!(accumulator.operation(), operation);
            assert_eq!(accumulator.state().len(), operation.state_width());
        }
    }

    #[test]
    fn names_round_trip() {
        for operation in ALL {
            let star = operation == AggregateOperation::CountStar;
            assert_eq!(
                AggregateOperation::from_name(operation.name(), star),
                Some(operation)
            );
        }

        assert_eq!(AggregateOperation::from_name("sum", true), None);
        assert_eq!(AggregateOperation::from_name("median", false), None);
    }

    #[test]
    fn idempotent_operations_ignore_duplicates() {
        for operation in ALL {
            let mut once = operation.create_accumulator();
            let mut repeated = operation.create_accumulator();

            for value in [1, 2] {
                once.update(&DataValue::Integer(value)).unwrap();
                repeated.update(&DataValue::Integer(value)).unwrap();
            }
            repeated.update(&DataValue::Integer(1)).unwrap();

            assert_eq!(
                once.evaluate() == repeated.evaluate(),
                operation.idempotent(),
                "{operation:?}"
            );
        }
    }
}
