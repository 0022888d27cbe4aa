//! This module defines the stages of a distributed aggregation
//! and the input distributions they require.

use std::hash::BuildHasher;

use hashbrown::DefaultHashBuilder;

use crate::{
    error::Error,
    function::{evaluation::Projection, tree::BoundExpression},
    tabular::Row,
};

/// Stage of a distributed aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateMode {
    /// Runs before the shuffle on arbitrarily partitioned input
    /// and outputs group keys together with intermediate accumulator states.
    Partial,
    /// Merges the intermediate states produced by [AggregateMode::Partial]
    /// and evaluates the output list.
    Final,
    /// Aggregates raw input in a single stage.
    /// The input must already be distributed as for [AggregateMode::Final].
    Complete,
}

/// Distribution of the input partitions required by an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    /// Rows may be distributed arbitrarily
    UnspecifiedDistribution,
    /// All rows must be in a single partition
    SinglePartition,
    /// Rows with equal values of the given expressions,
    /// which are bound to the schema of the input, must be in the same partition
    HashPartitioned(Vec<BoundExpression>),
}

impl Distribution {
    /// Distribute the given rows over `partitions` partitions such that they satisfy this requirement.
    ///
    /// Without a requirement, rows are assigned round robin.
    /// A [Distribution::SinglePartition] requirement always results in exactly one partition.
    ///
    /// # Errors
    /// Returns [Error::NestedAggregate] if a partitioning expression contains an aggregate.
    pub fn repartition<Rows>(&self, rows: Rows, partitions: usize) -> Result<Vec<Vec<Row>>, Error>
    where
        Rows: IntoIterator<Item = Row>,
    {
        let partitions = partitions.max(1);

        match self {
            Distribution::UnspecifiedDistribution => {
                let mut result = vec![Vec::new(); partitions];
                for (index, row) in rows.into_iter().enumerate() {
                    result[index % partitions].push(row);
                }

                Ok(result)
            }
            Distribution::SinglePartition => Ok(vec![rows.into_iter().collect()]),
            Distribution::HashPartitioned(expressions) => {
                let projection = Projection::new(expressions)?;
                let hash_builder = DefaultHashBuilder::default();
                let mut key = Vec::with_capacity(projection.arity());

                let mut result = vec![Vec::new(); partitions];
                for row in rows {
                    projection.evaluate_into(&row, &mut key);
                    result[partition_of(hash_builder.hash_one(&key), partitions)].push(row);
                }

                Ok(result)
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn partition_of(hash: u64, partitions: usize) -> usize {
    (hash % partitions as u64) as usize
}
