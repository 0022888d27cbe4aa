//! This module defines [AggregateBuffer], the running state of one group,
//! and [AggregateBufferFactory], which creates and updates such buffers.

use std::{mem::size_of, ops::Range};

use serde::{Deserialize, Serialize};

use crate::{
    datavalues::DataValue,
    error::Error,
    function::{evaluation::StackProgram, tree::BoundExpression},
    management::bytesized::{size_inner_vec_flat, ByteSized},
};

use super::{
    accumulators::{Accumulator, AccumulatorT},
    operation::AggregateOperation,
};

/// Accumulators of one group, in the order of the computed aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBuffer {
    accumulators: Vec<AccumulatorT>,
}

impl AggregateBuffer {
    /// Return the number of accumulators in this buffer.
    pub fn len(&self) -> usize {
        self.accumulators.len()
    }

    /// Return whether this buffer contains no accumulators.
    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    /// Return the accumulators of this buffer.
    pub fn accumulators(&self) -> &[AccumulatorT] {
        &self.accumulators
    }
}

impl ByteSized for AggregateBuffer {
    fn size_bytes(&self) -> u64 {
        size_of::<Self>() as u64
            + size_inner_vec_flat(&self.accumulators)
            + self
                .accumulators
                .iter()
                .map(ByteSized::size_bytes)
                .sum::<u64>()
    }
}

/// Where an accumulator takes its input from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateInput {
    /// Value of an expression over the input row; `None` for `count(*)`
    Argument(Option<BoundExpression>),
    /// Columns of the input row holding an intermediate state
    State(Range<usize>),
}

/// [AggregateInput] with its argument compiled
#[derive(Debug, Clone)]
enum CompiledInput {
    Argument(Option<StackProgram>),
    State(Range<usize>),
}

/// Creates [AggregateBuffer]s and feeds input rows into them
///
/// The factory is built once per operator.
/// Its entries are position-aligned with the computed aggregates.
#[derive(Debug, Clone)]
pub struct AggregateBufferFactory {
    inputs: Vec<(AggregateOperation, CompiledInput)>,
}

impl AggregateBufferFactory {
    /// Create a factory for accumulators of the given operations fed from the given inputs.
    ///
    /// # Errors
    /// Returns [Error::NestedAggregate] if an argument contains another aggregate call.
    pub fn new<'a, Iter>(aggregates: Iter) -> Result<Self, Error>
    where
        Iter: IntoIterator<Item = (AggregateOperation, &'a AggregateInput)>,
    {
        let inputs = aggregates
            .into_iter()
            .map(|(operation, input)| {
                let compiled = match input {
                    AggregateInput::Argument(argument) => CompiledInput::Argument(
                        argument
                            .as_ref()
                            .map(StackProgram::from_function_tree)
                            .transpose()?,
                    ),
                    AggregateInput::State(columns) => {
                        debug_assert_eq!(columns.len(), operation.state_width());
                        CompiledInput::State(columns.clone())
                    }
                };

                Ok((operation, compiled))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { inputs })
    }

    /// Return the number of accumulators in each buffer.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Return whether buffers contain no accumulators.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Return the operations of the accumulators, in buffer order.
    pub fn operations(&self) -> impl Iterator<Item = AggregateOperation> + '_ {
        self.inputs.iter().map(|(operation, _)| *operation)
    }

    /// Return the number of values produced by [AggregateBufferFactory::state].
    pub fn state_width(&self) -> usize {
        self.operations().map(|operation| operation.state_width()).sum()
    }

    /// Create a buffer in which every accumulator is in its zero state.
    pub fn create(&self) -> AggregateBuffer {
        AggregateBuffer {
            accumulators: self
                .operations()
                .map(|operation| operation.create_accumulator())
                .collect(),
        }
    }

    /// Update every accumulator of `buffer` with the given input row, in buffer order.
    pub fn update(&self, buffer: &mut AggregateBuffer, row: &[DataValue]) -> Result<(), Error> {
        debug_assert_eq!(buffer.len(), self.len());

        for ((_, input), accumulator) in self.inputs.iter().zip(buffer.accumulators.iter_mut()) {
            match input {
                CompiledInput::Argument(Some(program)) => {
                    accumulator.update(&program.evaluate(row))?
                }
                // count(*) does not look at its input
                CompiledInput::Argument(None) => accumulator.update(&DataValue::Null)?,
                CompiledInput::State(columns) => accumulator.merge_state(&row[columns.clone()])?,
            }
        }

        Ok(())
    }

    /// Merge `other` into `buffer`, accumulator by accumulator.
    ///
    /// # Errors
    /// Returns [Error::BufferLengthMismatch] if the buffers differ in length
    /// and [Error::AccumulatorMismatch] if they differ in the kind of some accumulator.
    pub fn merge(&self, buffer: &mut AggregateBuffer, other: &AggregateBuffer) -> Result<(), Error> {
        if buffer.len() != other.len() {
            return Err(Error::BufferLengthMismatch(buffer.len(), other.len()));
        }

        for (accumulator, other) in buffer.accumulators.iter_mut().zip(other.accumulators.iter()) {
            accumulator.merge(other)?;
        }

        Ok(())
    }

    /// Return the final value of every accumulator.
    pub fn evaluate(&self, buffer: &AggregateBuffer) -> Vec<DataValue> {
        buffer
            .accumulators
            .iter()
            .map(Accumulator::evaluate)
            .collect()
    }

    /// Return the intermediate states of all accumulators, one after another.
    pub fn state(&self, buffer: &AggregateBuffer) -> Vec<DataValue> {
        buffer
            .accumulators
            .iter()
            .flat_map(Accumulator::state)
            .collect()
    }
}
