//! Computes the maximum of all input values.

use std::{cmp::Ordering, mem::size_of};

use serde::{Deserialize, Serialize};

use crate::{
    aggregates::operation::AggregateOperation, datavalues::DataValue, error::Error,
    management::bytesized::ByteSized,
};

use super::{compare_values, single_state_value, Accumulator};

/// Keeps the largest non-null input value; the maximum of no values is `NULL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxAccumulator {
    current_max_value: Option<DataValue>,
}

impl MaxAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            current_max_value: None,
        }
    }
}

impl Accumulator for MaxAccumulator {
    fn operation(&self) -> AggregateOperation {
        AggregateOperation::Max
    }

    fn update(&mut self, value: &DataValue) -> Result<(), Error> {
        if value.is_null() {
            return Ok(());
        }

        match &self.current_max_value {
            Some(current_max_value) => {
                if compare_values(value, current_max_value) == Ordering::Greater {
                    self.current_max_value = Some(value.clone());
                }
            }
            None => self.current_max_value = Some(value.clone()),
        }

        Ok(())
    }

    fn state(&self) -> Vec<DataValue> {
        vec![self.evaluate()]
    }

    fn merge_state(&mut self, state: &[DataValue]) -> Result<(), Error> {
        let partial_max = single_state_value(self.operation(), state)?;
        self.update(partial_max)
    }

    fn evaluate(&self) -> DataValue {
        self.current_max_value.clone().unwrap_or(DataValue::Null)
    }
}

impl ByteSized for MaxAccumulator {
    fn size_bytes(&self) -> u64 {
        match &self.current_max_value {
            Some(value) => value.size_bytes(),
            None => size_of::<DataValue>() as u64,
        }
    }
}
