//! Counts the number of distinct input values.

use std::mem::size_of;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{
    aggregates::operation::AggregateOperation,
    datavalues::DataValue,
    error::Error,
    management::bytesized::{size_inner_hashset_flat, ByteSized},
};

use super::{malformed_state, single_state_value, Accumulator};

/// Keeps the set of distinct non-null input values
///
/// The intermediate state is the set itself, transported as a [DataValue::List].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountDistinctAccumulator {
    values: HashSet<DataValue>,
    /// Heap bytes of the values in `values`, maintained on insertion
    values_heap_bytes: u64,
}

impl CountDistinctAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            values: HashSet::new(),
            values_heap_bytes: 0,
        }
    }

    fn insert(&mut self, value: &DataValue) {
        if value.is_null() || self.values.contains(value) {
            return;
        }

        self.values_heap_bytes += value.size_bytes() - size_of::<DataValue>() as u64;
        self.values.insert(value.clone());
    }
}

impl Accumulator for CountDistinctAccumulator {
    fn operation(&self) -> AggregateOperation {
        AggregateOperation::CountDistinct
    }

    fn update(&mut self, value: &DataValue) -> Result<(), Error> {
        self.insert(value);
        Ok(())
    }

    fn state(&self) -> Vec<DataValue> {
        let mut values = self.values.iter().cloned().collect::<Vec<_>>();
        values.sort_unstable();

        vec![DataValue::List(values)]
    }

    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error> {
        match single_state_value(self.operation(), state)? {
            DataValue::List(values) => {
                for value in values {
                    self.insert(value);
                }

                Ok(())
            }
            _ => Err(malformed_state(self.operation(), state)),
        }
    }

    fn evaluate(&self) -> DataValue {
        DataValue::Integer(i64::try_from(self.values.len()).unwrap_or(i64::MAX))
    }
}

impl ByteSized for CountDistinctAccumulator {
    fn size_bytes(&self) -> u64 {
        size_of::<Self>() as u64 + size_inner_hashset_flat(&self.values) + self.values_heap_bytes
    }
}

#[cfg(test)]
mod test {
    use super::CountDistinctAccumulator;
    use crate::{aggregates::accumulators::Accumulator, datavalues::DataValue};
    use test_log::test;

    #[test]
    fn state_is_sorted_set() {
        let mut accumulator = CountDistinctAccumulator::new();

        for value in [3, 1, 3, 2] {
            accumulator.update(&DataValue::Integer(value)).unwrap();
        }
        accumulator.update(&DataValue::Null).unwrap();

        assert_eq!(accumulator.evaluate(), DataValue::Integer(3));
        assert_eq!(
            accumulator.state(),
            vec![DataValue::List(vec![
                DataValue::Integer(1),
                DataValue::Integer(2),
                DataValue::Integer(3)
            ])]
        );
    }
}
