//! Temporary file holding one spill of an [ExternalCombinerMap][super::ExternalCombinerMap]

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;

/// Byte range of one bucket inside a [SpillFile]
#[derive(Debug, Clone, Copy)]
struct BucketRange {
    start: u64,
    length: u64,
}

/// Entries of a spill, partitioned into buckets
///
/// Each bucket is stored contiguously as a stream of JSON values.
/// The file is anonymous, so it disappears once this object is dropped.
#[derive(Debug)]
pub(crate) struct SpillFile {
    file: File,
    buckets: Vec<BucketRange>,
}

impl SpillFile {
    /// Write the given buckets into a fresh temporary file.
    pub(crate) fn write<K, C>(
        buckets: &[Vec<(K, C)>],
        directory: Option<&Path>,
    ) -> Result<Self, Error>
    where
        K: Serialize,
        C: Serialize,
    {
        let file = match directory {
            Some(directory) => tempfile::tempfile_in(directory)?,
            None => tempfile::tempfile()?,
        };

        let mut writer = BufWriter::new(file);
        let mut ranges = Vec::with_capacity(buckets.len());
        let mut start = 0u64;
        let mut serialized = Vec::new();

        for bucket in buckets {
            serialized.clear();
            for entry in bucket {
                serde_json::to_writer(&mut serialized, entry)?;
                serialized.push(b'\n');
            }

            writer.write_all(&serialized)?;

            let length = serialized.len() as u64;
            ranges.push(BucketRange { start, length });
            start += length;
        }

        let file = writer.into_inner().map_err(|error| error.into_error())?;

        Ok(Self {
            file,
            buckets: ranges,
        })
    }

    /// Return the total number of bytes written to this file.
    pub(crate) fn size_bytes(&self) -> u64 {
        self.buckets.iter().map(|range| range.length).sum()
    }

    /// Read the entries of the given bucket.
    pub(crate) fn read_bucket<'a, K, C>(
        &'a self,
        bucket: usize,
    ) -> Result<impl Iterator<Item = Result<(K, C), Error>> + 'a, Error>
    where
        K: DeserializeOwned + 'a,
        C: DeserializeOwned + 'a,
    {
        let range = self.buckets[bucket];

        let mut file = &self.file;
        file.seek(SeekFrom::Start(range.start))?;
        let reader = BufReader::new(file.take(range.length));

        Ok(serde_json::Deserializer::from_reader(reader)
            .into_iter::<(K, C)>()
            .map(|entry| entry.map_err(Error::from)))
    }
}

#[cfg(test)]
mod test {
    use super::SpillFile;
    use test_log::test;

    #[test]
    fn buckets_are_read_back_separately() {
        let buckets = vec![
            vec![(1u32, "one".to_string()), (3, "three".to_string())],
            vec![],
            vec![(2, "two".to_string())],
        ];

        let file = SpillFile::write(&buckets, None).unwrap();

        for (index, bucket) in buckets.iter().enumerate() {
            let entries = file
                .read_bucket::<u32, String>(index)
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();

            assert_eq!(&entries, bucket);
        }

        assert!(file.size_bytes() > 0);
    }
}
