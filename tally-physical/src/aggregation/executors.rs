//! This module contains the strategies with which an aggregation groups its input.
//!
//! Every strategy consumes the complete input of a partition
//! and afterwards hands out one aggregate buffer per distinct group key.

pub(crate) mod external_grouping;
pub(crate) mod hash_grouping;
pub(crate) mod no_grouping;

use enum_dispatch::enum_dispatch;

use crate::{
    aggregates::buffer::AggregateBuffer,
    datavalues::DataValue,
    error::Error,
    tabular::GroupKey,
};

use self::{
    external_grouping::{ExternalGroupingExecutor, ExternalGroups},
    hash_grouping::{HashGroupingExecutor, HashGroups},
    no_grouping::{NoGroupingExecutor, SingleGroup},
};

/// Strategy used to group the input of an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateStrategy {
    /// One global group, used whenever there are no grouping expressions
    NoGrouping,
    /// All groups are kept in an in-memory hash map
    #[default]
    Hash,
    /// Groups are kept in a map that spills to disk once it exceeds its memory budget
    External,
}

/// Consumes input rows and groups them
#[enum_dispatch]
pub(crate) trait GroupingExecutor {
    /// Process one input row.
    fn consume(&mut self, row: &[DataValue]) -> Result<(), Error>;

    /// Finish consuming and return the groups.
    fn into_groups(self) -> GroupsT;
}

/// Enum containing all implementations of [GroupingExecutor]
#[enum_dispatch(GroupingExecutor)]
#[derive(Debug)]
pub(crate) enum GroupingExecutorT {
    NoGroupingExecutor,
    HashGroupingExecutor,
    ExternalGroupingExecutor,
}

/// Iterator over the groups produced by a [GroupingExecutor]
#[derive(Debug)]
pub(crate) enum GroupsT {
    Single(SingleGroup),
    Hash(HashGroups),
    External(ExternalGroups),
}

impl Iterator for GroupsT {
    type Item = Result<(GroupKey, AggregateBuffer), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            GroupsT::Single(groups) => groups.next(),
            GroupsT::Hash(groups) => groups.next(),
            GroupsT::External(groups) => groups.next(),
        }
    }
}
