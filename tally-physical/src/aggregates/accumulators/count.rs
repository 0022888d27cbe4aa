//! Count the input values. Always returns an integer, independent of the input value type.

use std::mem::size_of;

use serde::{Deserialize, Serialize};

use crate::{
    aggregates::operation::AggregateOperation, datavalues::DataValue, error::Error,
    management::bytesized::ByteSized,
};

use super::{malformed_state, single_state_value, Accumulator};

/// Counts input values; depending on `include_nulls` this is `count(*)` or `count(expr)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountAccumulator {
    current_count: i64,
    include_nulls: bool,
}

impl CountAccumulator {
    pub(crate) fn new(include_nulls: bool) -> Self {
        Self {
            current_count: 0,
            include_nulls,
        }
    }

    fn add(&mut self, count: i64) -> Result<(), Error> {
        self.current_count = self
            .current_count
            .checked_add(count)
            .ok_or(Error::IntegerOverflow(self.operation()))?;

        Ok(())
    }
}

impl Accumulator for CountAccumulator {
    fn operation(&self) -> AggregateOperation {
        if self.include_nulls {
            AggregateOperation::CountStar
        } else {
            AggregateOperation::Count
        }
    }

    fn update(&mut self, value: &DataValue) -> Result<(), Error> {
        if self.include_nulls || !value.is_null() {
            self.add(1)?;
        }

        Ok(())
    }

    fn state(&self) -> Vec<DataValue> {
        vec![DataValue::Integer(self.current_count)]
    }

    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error> {
        match single_state_value(self.operation(), state)? {
            DataValue::Integer(count) => self.add(*count),
            _ => Err(malformed_state(self.operation(), state)),
        }
    }

    fn evaluate(&self) -> DataValue {
        DataValue::Integer(self.current_count)
    }
}

impl ByteSized for CountAccumulator {
    fn size_bytes(&self) -> u64 {
        size_of::<Self>() as u64
    }
}
