//! Library part of the `tally` command line tool:
//! argument parsing, CSV input and output,
//! and a driver that runs an aggregation in one or two stages over partitioned input.

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
    variant_size_differences
)]

pub mod cli;
pub mod driver;
pub mod error;
pub mod table;
