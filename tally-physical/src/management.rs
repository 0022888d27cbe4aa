//! This module contains the memory accounting used to keep aggregation state bounded.

pub mod bytesized;
