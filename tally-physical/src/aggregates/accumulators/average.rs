//! Computes the arithmetic mean of all input values.

use std::mem::size_of;

use serde::{Deserialize, Serialize};

use crate::{
    aggregates::operation::AggregateOperation, datavalues::DataValue, error::Error,
    management::bytesized::ByteSized,
};

use super::{malformed_state, sum::add_numeric, Accumulator};

/// Keeps sum and count of the non-null input values
///
/// Partial averages are never combined directly;
/// the intermediate state is the pair of sum and count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageAccumulator {
    current_sum: DataValue,
    current_count: i64,
}

impl AverageAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            current_sum: DataValue::Null,
            current_count: 0,
        }
    }

    fn add(&mut self, sum: &DataValue, count: i64) -> Result<(), Error> {
        self.current_sum = add_numeric(AggregateOperation::Average, &self.current_sum, sum)?;
        self.current_count = self
            .current_count
            .checked_add(count)
            .ok_or(Error::IntegerOverflow(AggregateOperation::Average))?;

        Ok(())
    }
}

impl Accumulator for AverageAccumulator {
    fn operation(&self) -> AggregateOperation {
        AggregateOperation::Average
    }

    fn update(&mut self, value: &DataValue) -> Result<(), Error> {
        if value.is_null() {
            return Ok(());
        }

        self.add(value, 1)
    }

    fn state(&self) -> Vec<DataValue> {
        vec![
            self.current_sum.clone(),
            DataValue::Integer(self.current_count),
        ]
    }

    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error> {
        match state {
            [sum, DataValue::Integer(count)] => self.add(sum, *count),
            _ => Err(malformed_state(self.operation(), state)),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn evaluate(&self) -> DataValue {
        if self.current_count == 0 {
            return DataValue::Null;
        }

        match self.current_sum.as_f64() {
            Some(sum) => DataValue::double(sum / self.current_count as f64),
            None => DataValue::Null,
        }
    }
}

impl ByteSized for AverageAccumulator {
    fn size_bytes(&self) -> u64 {
        self.current_sum.size_bytes() + size_of::<i64>() as u64
    }
}

#[cfg(test)]
mod test {
    use super::AverageAccumulator;
    use crate::{aggregates::accumulators::Accumulator, datavalues::DataValue};
    use test_log::test;

    #[test]
    fn merges_sum_and_count() {
        // avg(1, 2) merged with avg(9) is 4, not the mean of the two averages
        let mut first = AverageAccumulator::new();
        first.update(&DataValue::Integer(1)).unwrap();
        first.update(&DataValue::Integer(2)).unwrap();

        let mut second = AverageAccumulator::new();
        second.update(&DataValue::Integer(9)).unwrap();

        first.merge_state(&second.state()).unwrap();

        assert_eq!(first.evaluate(), DataValue::double(4.0));
        assert_eq!(
            first.state(),
            vec![DataValue::Integer(12), DataValue::Integer(3)]
        );
    }
}
