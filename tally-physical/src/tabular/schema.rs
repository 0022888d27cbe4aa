//! This module defines [Schema].

use std::fmt;

use itertools::Itertools;

use crate::error::Error;

/// Ordered list of attribute names describing the layout of rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    attributes: Vec<String>,
}

impl Schema {
    /// Create a new [Schema] from a list of attribute names.
    pub fn new<Iter>(attributes: Iter) -> Self
    where
        Iter: IntoIterator,
        Iter::Item: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Return the number of columns.
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    /// Return the attribute names in column order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Return the position of the first attribute with the given name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|attribute| attribute == name)
    }

    /// Return the position of the attribute with the given name
    /// or an [Error::UnresolvedColumn] if there is none.
    pub fn resolve(&self, name: &str) -> Result<usize, Error> {
        self.position(name).ok_or_else(|| Error::UnresolvedColumn {
            column: name.to_string(),
            schema: self.to_string(),
        })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attributes.iter().join(", "))
    }
}
