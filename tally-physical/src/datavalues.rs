//! This module defines the dynamically typed values that flow through the aggregation operator.

pub mod datavalue;
pub mod double;
pub mod errors;

pub use datavalue::DataValue;
pub use double::Double;
pub use errors::DataValueCreationError;
