//! This module implements a map from keys to combined values
//! that moves its content to temporary files once it exceeds its memory budget.

pub mod combiner_map;
pub(crate) mod spill_file;

pub use combiner_map::{Combiner, ExternalCombinerMap, MergedEntries};
