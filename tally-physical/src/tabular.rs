//! This module defines rows, group keys and schemas.

pub mod row;
pub mod schema;

pub use row::{GroupKey, Row};
pub use schema::Schema;
