//! This module defines [AggregationConfig].

use std::path::{Path, PathBuf};

/// Default memory budget of the external grouping strategy: 64 MiB
pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 64 * 1024 * 1024;
/// Default number of buckets spilled state is partitioned into
pub const DEFAULT_SPILL_BUCKETS: usize = 16;

/// Resource limits of one aggregation operator instance
///
/// All limits are per partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationConfig {
    memory_budget_bytes: u64,
    max_resident_groups: Option<usize>,
    spill_buckets: usize,
    spill_directory: Option<PathBuf>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            max_resident_groups: None,
            spill_buckets: DEFAULT_SPILL_BUCKETS,
            spill_directory: None,
        }
    }
}

impl AggregationConfig {
    /// Set the number of bytes of group state that may be held in memory before spilling.
    pub fn with_memory_budget_bytes(mut self, bytes: u64) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    /// Set the maximal number of groups that may be held in memory before spilling.
    pub fn with_max_resident_groups(mut self, groups: usize) -> Self {
        self.max_resident_groups = Some(groups.max(1));
        self
    }

    /// Set the number of buckets spilled state is partitioned into.
    ///
    /// During emission only one bucket is held in memory at a time.
    pub fn with_spill_buckets(mut self, buckets: usize) -> Self {
        self.spill_buckets = buckets.max(1);
        self
    }

    /// Set the directory spill files are created in.
    pub fn with_spill_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.spill_directory = Some(directory.into());
        self
    }

    /// Return the memory budget in bytes.
    pub fn memory_budget_bytes(&self) -> u64 {
        self.memory_budget_bytes
    }

    /// Return the maximal number of resident groups, if limited.
    pub fn max_resident_groups(&self) -> Option<usize> {
        self.max_resident_groups
    }

    /// Return the number of spill buckets.
    pub fn spill_buckets(&self) -> usize {
        self.spill_buckets
    }

    /// Return the directory for spill files.
    /// `None` means the temporary directory of the system.
    pub fn spill_directory(&self) -> Option<&Path> {
        self.spill_directory.as_deref()
    }
}
