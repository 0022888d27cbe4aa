//! Exposes supported aggregate operations, their accumulators and the per-group aggregate buffer

pub mod accumulators;
pub mod buffer;
pub mod operation;
