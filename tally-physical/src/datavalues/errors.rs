//! This module defines errors that are relevant when dealing with data values.

use thiserror::Error;

/// Potential errors encountered when trying to construct [`DataValue`][super::DataValue]s.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataValueCreationError {
    /// Error for floating point numbers that are not finite
    #[error("floating point number must represent a finite value (no infinity, no NaN)")]
    NonFiniteFloat,
}
