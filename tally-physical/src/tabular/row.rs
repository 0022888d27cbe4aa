//! This module defines [Row] and [GroupKey].

use std::{borrow::Borrow, fmt, ops::Deref};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::datavalues::DataValue;

/// A row of values, laid out according to some [Schema][super::Schema]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Row(Vec<DataValue>);

impl Row {
    /// Create a new [Row] from the given values.
    pub fn new(values: Vec<DataValue>) -> Self {
        Self(values)
    }

    /// Return the values of this row.
    pub fn into_values(self) -> Vec<DataValue> {
        self.0
    }
}

impl Deref for Row {
    type Target = [DataValue];

    fn deref(&self) -> &[DataValue] {
        &self.0
    }
}

impl From<Vec<DataValue>> for Row {
    fn from(values: Vec<DataValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<DataValue> for Row {
    fn from_iter<T: IntoIterator<Item = DataValue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

/// Evaluated grouping expressions of a row
///
/// A [GroupKey] owns its values.
/// It is only ever created by copying a (possibly reused) scratch buffer,
/// so a key stored in a map never aliases mutable state.
/// It can be borrowed as a slice, which allows looking up a scratch buffer
/// in a map without allocating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey(Box<[DataValue]>);

impl GroupKey {
    /// Return the values of this key.
    pub fn values(&self) -> &[DataValue] {
        &self.0
    }

    /// Return the number of grouping expressions this key was built from.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether this is the key of the single group of an ungrouped aggregation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[DataValue]> for GroupKey {
    fn from(values: &[DataValue]) -> Self {
        Self(values.into())
    }
}

impl Borrow<[DataValue]> for GroupKey {
    fn borrow(&self) -> &[DataValue] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0.iter().join(", "))
    }
}
