//! Error-handling module for the crate

use thiserror::Error;

use crate::aggregates::operation::AggregateOperation;

/// Error-Collection for all the possible Errors occurring in this crate
#[allow(variant_size_differences)]
#[derive(Error, Debug)]
pub enum Error {
    /// A column reference could not be resolved against the child schema
    #[error("column `{column}` does not exist in the input schema [{schema}]")]
    UnresolvedColumn {
        /// Name of the referenced column
        column: String,
        /// Printed form of the schema the column was looked up in
        schema: String,
    },
    /// A column is used in the output list outside of an aggregate and is not grouped
    #[error("column `{0}` must appear in the grouping expressions or be used inside an aggregate")]
    UngroupedColumn(String),
    /// An aggregate call appears in a position where aggregates are not allowed
    #[error("aggregate `{0}` may not be nested inside another aggregate or a grouping expression")]
    NestedAggregate(String),
    /// The input of a final aggregation does not have the layout produced by the partial aggregation
    #[error("input schema [{found}] of the final aggregation does not match the partial aggregation output [{expected}]")]
    PartialSchemaMismatch {
        /// Layout produced by the partial aggregation
        expected: String,
        /// Layout that was actually provided
        found: String,
    },
    /// Two accumulators of different kinds were asked to merge
    #[error("cannot merge accumulator of kind {found:?} into accumulator of kind {expected:?}")]
    AccumulatorMismatch {
        /// Kind of the receiving accumulator
        expected: AggregateOperation,
        /// Kind of the absorbed accumulator
        found: AggregateOperation,
    },
    /// Two aggregate buffers with a different number of accumulators were asked to merge
    #[error("cannot merge aggregate buffers of length {0} and {1}")]
    BufferLengthMismatch(usize, usize),
    /// An intermediate state handed to an accumulator has the wrong shape
    #[error("malformed intermediate state for {operation:?}: {state}")]
    MalformedState {
        /// Kind of the receiving accumulator
        operation: AggregateOperation,
        /// Printed form of the rejected state
        state: String,
    },
    /// An integer aggregate left the range of 64 bit integers
    #[error("integer overflow in {0:?} aggregate")]
    IntegerOverflow(AggregateOperation),
    /// A floating point aggregate left the range of finite doubles
    #[error("floating point result of {0:?} aggregate is not finite")]
    NonFiniteAggregate(AggregateOperation),
    /// A numeric aggregate received a value that is not a number
    #[error("{operation:?} aggregate expects numeric input, found {value}")]
    NonNumericAggregateInput {
        /// Kind of the aggregate
        operation: AggregateOperation,
        /// Printed form of the rejected value
        value: String,
    },
    /// Reading or writing spilled aggregation state failed
    #[error("spilling aggregation state failed: {0}")]
    SpillIo(#[from] std::io::Error),
    /// Spilled aggregation state could not be (de)serialized
    #[error("spilled aggregation state could not be (de)serialized: {0}")]
    SpillSerialization(#[from] serde_json::Error),
}
