//! This module defines all the errors that can occur while executing tally-cli.

use thiserror::Error;

/// Error that occur during execution of the `tally` binary
#[derive(Error, Debug)]
pub enum CliError {
    /// Error if neither grouping expressions nor aggregates are given
    #[error("nothing to compute: give at least one --group-by or --aggregate")]
    NothingToCompute,
    /// Error while reading or writing CSV data
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Error resulting from io operations
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Error originating from the aggregation
    #[error(transparent)]
    AggregationError(#[from] tally_physical::error::Error),
}
