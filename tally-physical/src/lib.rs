//! This crate implements the grouped aggregation operator of a partitioned
//! SQL execution engine, i.e., it corresponds to the physical layer that
//! turns partitions of input rows into one output row per group.
//! It also carries the small collaborators the operator needs to run:
//! dynamically typed values, an expression engine and a spill-capable combiner map.

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

pub mod aggregates;
pub mod aggregation;
pub mod datavalues;
pub mod error;
pub mod function;
pub mod management;
pub mod spill;
pub mod tabular;
