//! This module defines [ExternalCombinerMap].

use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    mem::size_of,
    path::PathBuf,
};

use hashbrown::{hash_map, DefaultHashBuilder, HashMap};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    aggregation::config::AggregationConfig,
    error::Error,
    management::bytesized::{size_hashmap_entry_flat, ByteSized},
};

use super::spill_file::SpillFile;

/// Callbacks with which an [ExternalCombinerMap] folds values into combiners
pub trait Combiner {
    /// Values that are inserted into the map
    type Value: ?Sized;
    /// Combined state of all values of one key
    type Combined: ByteSized + Serialize + DeserializeOwned;

    /// Create a combiner for a key that has not been seen before from its first value.
    fn create_combiner(&self, value: &Self::Value) -> Result<Self::Combined, Error>;

    /// Fold one more value into an existing combiner.
    fn merge_value(&self, combiner: &mut Self::Combined, value: &Self::Value)
        -> Result<(), Error>;

    /// Merge two combiners that belong to the same key.
    ///
    /// Must be commutative and associative,
    /// since spilled combiners are merged in no particular order.
    ///
    /// Errors are the exception: a combiner that fails on some intermediate result,
    /// like an integer sum leaving the range of `i64`, may fail for one merge order and
    /// succeed for another. Whether such an input is rejected then depends on when spills happen.
    fn merge_combiners(
        &self,
        combiner: &mut Self::Combined,
        other: Self::Combined,
    ) -> Result<(), Error>;
}

/// Map from keys to combiners with a bounded memory footprint
///
/// Once the resident entries exceed the memory budget or the maximal number of groups,
/// all of them are written to a temporary file and the map starts over empty.
/// Hence, a key may have several combiners, at most one per spill plus one in memory.
/// They are merged by [ExternalCombinerMap::into_merged].
///
/// Spilled entries are partitioned into buckets by the hash of their key.
/// Emission handles one bucket at a time,
/// so at most one bucket worth of combiners is in memory while merging.
pub struct ExternalCombinerMap<K, F: Combiner> {
    combiner: F,
    hash_builder: DefaultHashBuilder,
    resident: HashMap<K, F::Combined>,
    resident_bytes: u64,

    memory_budget_bytes: u64,
    max_resident_groups: Option<usize>,
    buckets: usize,
    spill_directory: Option<PathBuf>,

    spill_files: Vec<SpillFile>,
    spilled_bytes: u64,
}

impl<K, F: Combiner> fmt::Debug for ExternalCombinerMap<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalCombinerMap")
            .field("resident_groups", &self.resident.len())
            .field("resident_bytes", &self.resident_bytes)
            .field("memory_budget_bytes", &self.memory_budget_bytes)
            .field("spill_count", &self.spill_files.len())
            .field("spilled_bytes", &self.spilled_bytes)
            .finish()
    }
}

impl<K, F> ExternalCombinerMap<K, F>
where
    K: Hash + Eq + ByteSized + Serialize + DeserializeOwned,
    F: Combiner,
{
    /// Create an empty map with the limits of the given [AggregationConfig].
    pub fn new(combiner: F, config: &AggregationConfig) -> Self {
        let hash_builder = DefaultHashBuilder::default();

        Self {
            combiner,
            resident: HashMap::with_hasher(hash_builder.clone()),
            hash_builder,
            resident_bytes: 0,
            memory_budget_bytes: config.memory_budget_bytes(),
            max_resident_groups: config.max_resident_groups(),
            buckets: config.spill_buckets(),
            spill_directory: config.spill_directory().map(PathBuf::from),
            spill_files: Vec::new(),
            spilled_bytes: 0,
        }
    }

    /// Return the number of times the resident entries were written to disk.
    pub fn spill_count(&self) -> usize {
        self.spill_files.len()
    }

    /// Return the number of bytes written to disk so far.
    pub fn spilled_bytes(&self) -> u64 {
        self.spilled_bytes
    }

    /// Return the number of entries currently held in memory.
    pub fn resident_groups(&self) -> usize {
        self.resident.len()
    }

    /// Return the estimated size of the entries currently held in memory.
    pub fn resident_bytes(&self) -> u64 {
        self.resident_bytes
    }

    /// Fold `value` into the combiner of `key`.
    ///
    /// The key is only copied if it is not resident yet.
    ///
    /// # Errors
    /// Propagates errors of the [Combiner] and of writing spill files.
    pub fn insert<Q>(&mut self, key: &Q, value: &F::Value) -> Result<(), Error>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q> + for<'a> From<&'a Q>,
    {
        if let Some(existing) = self.resident.get_mut(key) {
            let before = existing.size_bytes();
            self.combiner.merge_value(existing, value)?;
            let after = existing.size_bytes();

            self.resident_bytes = (self.resident_bytes + after).saturating_sub(before);
        } else {
            if self
                .max_resident_groups
                .is_some_and(|maximum| self.resident.len() >= maximum)
            {
                self.spill()?;
            }

            let key = K::from(key);
            let combiner = self.combiner.create_combiner(value)?;

            self.resident_bytes +=
                size_hashmap_entry_flat::<K, F::Combined>() + key.size_bytes() + combiner.size_bytes()
                    - (size_of::<K>() + size_of::<F::Combined>()) as u64;
            self.resident.insert(key, combiner);
        }

        if self.resident_bytes > self.memory_budget_bytes {
            self.spill()?;
        }

        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket_of(hash_builder: &DefaultHashBuilder, buckets: usize, key: &K) -> usize {
        (hash_builder.hash_one(key) % buckets as u64) as usize
    }

    /// Drain the resident entries into per-bucket vectors.
    fn drain_into_buckets(&mut self) -> Vec<Vec<(K, F::Combined)>> {
        let mut buckets = (0..self.buckets).map(|_| Vec::new()).collect::<Vec<_>>();

        for (key, combiner) in self.resident.drain() {
            let bucket = Self::bucket_of(&self.hash_builder, self.buckets, &key);
            buckets[bucket].push((key, combiner));
        }

        self.resident_bytes = 0;
        buckets
    }

    /// Write all resident entries to a new spill file.
    fn spill(&mut self) -> Result<(), Error> {
        if self.resident.is_empty() {
            return Ok(());
        }

        let groups = self.resident.len();
        let resident_bytes = self.resident_bytes;
        let buckets = self.drain_into_buckets();

        let file = SpillFile::write(&buckets, self.spill_directory.as_deref())?;
        self.spilled_bytes += file.size_bytes();

        log::debug!(
            "spilled {groups} groups ({resident_bytes} resident bytes) into {} bytes on disk, spill #{}",
            file.size_bytes(),
            self.spill_files.len() + 1
        );

        self.spill_files.push(file);
        Ok(())
    }

    /// Consume the map and return every key together with its fully merged combiner.
    ///
    /// Entries are produced lazily in no particular order.
    /// If there was no spill, the resident entries are returned as they are.
    pub fn into_merged(mut self) -> MergedEntries<K, F> {
        if self.spill_files.is_empty() {
            return MergedEntries {
                combiner: self.combiner,
                spill_files: Vec::new(),
                pending: Vec::new(),
                next_bucket: 0,
                current: self.resident.into_iter(),
                failed: false,
            };
        }

        log::debug!(
            "merging {} resident groups with {} spill files in {} buckets",
            self.resident.len(),
            self.spill_files.len(),
            self.buckets
        );

        let pending = self.drain_into_buckets();

        MergedEntries {
            combiner: self.combiner,
            spill_files: self.spill_files,
            pending,
            next_bucket: 0,
            current: HashMap::new().into_iter(),
            failed: false,
        }
    }
}

/// Iterator over the fully merged entries of an [ExternalCombinerMap]
///
/// After an error no further entries are produced.
pub struct MergedEntries<K, F: Combiner> {
    combiner: F,
    spill_files: Vec<SpillFile>,
    pending: Vec<Vec<(K, F::Combined)>>,
    next_bucket: usize,
    current: hash_map::IntoIter<K, F::Combined>,
    failed: bool,
}

impl<K, F: Combiner> fmt::Debug for MergedEntries<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedEntries")
            .field("spill_files", &self.spill_files.len())
            .field("next_bucket", &self.next_bucket)
            .field("buckets", &self.pending.len())
            .field("failed", &self.failed)
            .finish()
    }
}

impl<K, F> MergedEntries<K, F>
where
    K: Hash + Eq + DeserializeOwned,
    F: Combiner,
{
    /// Combine the resident part of a bucket with its part in every spill file.
    fn load_bucket(&mut self, bucket: usize) -> Result<HashMap<K, F::Combined>, Error> {
        let mut merged = std::mem::take(&mut self.pending[bucket])
            .into_iter()
            .collect::<HashMap<K, F::Combined>>();

        for file in &self.spill_files {
            for entry in file.read_bucket::<K, F::Combined>(bucket)? {
                let (key, combiner) = entry?;

                match merged.entry(key) {
                    hash_map::Entry::Occupied(mut occupied) => {
                        self.combiner.merge_combiners(occupied.get_mut(), combiner)?
                    }
                    hash_map::Entry::Vacant(vacant) => {
                        vacant.insert(combiner);
                    }
                }
            }
        }

        log::trace!("bucket {bucket} holds {} groups", merged.len());

        Ok(merged)
    }
}

impl<K, F> Iterator for MergedEntries<K, F>
where
    K: Hash + Eq + DeserializeOwned,
    F: Combiner,
{
    type Item = Result<(K, F::Combined), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(Ok(entry));
            }

            if self.failed || self.next_bucket >= self.pending.len() {
                return None;
            }

            let bucket = self.next_bucket;
            self.next_bucket += 1;

            match self.load_bucket(bucket) {
                Ok(merged) => self.current = merged.into_iter(),
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}
