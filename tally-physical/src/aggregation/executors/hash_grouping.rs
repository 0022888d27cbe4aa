//! Aggregation with an in-memory hash map from group key to aggregate buffer

use hashbrown::{hash_map, HashMap};

use crate::{
    aggregates::buffer::{AggregateBuffer, AggregateBufferFactory},
    datavalues::DataValue,
    error::Error,
    function::evaluation::Projection,
    tabular::GroupKey,
};

use super::{GroupingExecutor, GroupsT};

/// Keeps one aggregate buffer per distinct group key in memory
///
/// Memory grows with the number of distinct keys without bound.
#[derive(Debug)]
pub(crate) struct HashGroupingExecutor {
    factory: AggregateBufferFactory,
    key: Projection,
    scratch: Vec<DataValue>,
    groups: HashMap<GroupKey, AggregateBuffer>,
}

impl HashGroupingExecutor {
    pub(crate) fn new(factory: AggregateBufferFactory, key: Projection) -> Self {
        Self {
            factory,
            scratch: Vec::with_capacity(key.arity()),
            key,
            groups: HashMap::new(),
        }
    }
}

impl GroupingExecutor for HashGroupingExecutor {
    fn consume(&mut self, row: &[DataValue]) -> Result<(), Error> {
        self.key.evaluate_into(row, &mut self.scratch);

        match self.groups.get_mut(self.scratch.as_slice()) {
            Some(buffer) => self.factory.update(buffer, row),
            None => {
                let mut buffer = self.factory.create();
                self.factory.update(&mut buffer, row)?;

                let key = GroupKey::from(self.scratch.as_slice());
                log::trace!("new group {key}");
                self.groups.insert(key, buffer);

                Ok(())
            }
        }
    }

    fn into_groups(self) -> GroupsT {
        log::debug!("hash aggregation collected {} groups", self.groups.len());
        GroupsT::Hash(HashGroups(self.groups.into_iter()))
    }
}

/// The groups of a [HashGroupingExecutor], in hash order
#[derive(Debug)]
pub(crate) struct HashGroups(hash_map::IntoIter<GroupKey, AggregateBuffer>);

impl Iterator for HashGroups {
    type Item = Result<(GroupKey, AggregateBuffer), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }
}
