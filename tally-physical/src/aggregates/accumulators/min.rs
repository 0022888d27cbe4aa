//! Computes the minimum of all input values.

use std::{cmp::Ordering, mem::size_of};

use serde::{Deserialize, Serialize};

use crate::{
    aggregates::operation::AggregateOperation, datavalues::DataValue, error::Error,
    management::bytesized::ByteSized,
};

use super::{compare_values, single_state_value, Accumulator};

/// Keeps the smallest non-null input value; the minimum of no values is `NULL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinAccumulator {
    current_min_value: Option<DataValue>,
}

impl MinAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            current_min_value: None,
        }
    }
}

impl Accumulator for MinAccumulator {
    fn operation(&self) -> AggregateOperation {
        AggregateOperation::Min
    }

    fn update(&mut self, value: &DataValue) -> Result<(), Error> {
        if value.is_null() {
            return Ok(());
        }

        match &self.current_min_value {
            Some(current_min_value) => {
                if compare_values(value, current_min_value) == Ordering::Less {
                    self.current_min_value = Some(value.clone());
                }
            }
            None => self.current_min_value = Some(value.clone()),
        }

        Ok(())
    }

    fn state(&self) -> Vec<DataValue> {
        vec![self.evaluate()]
    }

    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error> {
        let partial_min = single_state_value(self.operation(), state)?;
        self.update(partial_min)
    }

    fn evaluate(&self) -> DataValue {
        self.current_min_value.clone().unwrap_or(DataValue::Null)
    }
}

impl ByteSized for MinAccumulator {
    fn size_bytes(&self) -> u64 {
        match &self.current_min_value {
            Some(value) => value.size_bytes(),
            None => size_of::<DataValue>() as u64,
        }
    }
}
