//! Aggregation with a bounded amount of memory

use crate::{
    aggregates::buffer::{AggregateBuffer, AggregateBufferFactory},
    aggregation::config::AggregationConfig,
    datavalues::DataValue,
    error::Error,
    function::evaluation::Projection,
    spill::{Combiner, ExternalCombinerMap, MergedEntries},
    tabular::GroupKey,
};

use super::{GroupingExecutor, GroupsT};

impl Combiner for AggregateBufferFactory {
    type Value = [DataValue];
    type Combined = AggregateBuffer;

    fn create_combiner(&self, row: &[DataValue]) -> Result<AggregateBuffer, Error> {
        let mut buffer = self.create();
        self.update(&mut buffer, row)?;

        Ok(buffer)
    }

    fn merge_value(&self, buffer: &mut AggregateBuffer, row: &[DataValue]) -> Result<(), Error> {
        self.update(buffer, row)
    }

    fn merge_combiners(
        &self,
        buffer: &mut AggregateBuffer,
        other: AggregateBuffer,
    ) -> Result<(), Error> {
        self.merge(buffer, &other)
    }
}

/// Groups rows in an [ExternalCombinerMap],
/// which moves aggregate buffers to disk when they exceed the memory budget
#[derive(Debug)]
pub(crate) struct ExternalGroupingExecutor {
    key: Projection,
    scratch: Vec<DataValue>,
    groups: ExternalCombinerMap<GroupKey, AggregateBufferFactory>,
}

impl ExternalGroupingExecutor {
    pub(crate) fn new(
        factory: AggregateBufferFactory,
        key: Projection,
        config: &AggregationConfig,
    ) -> Self {
        Self {
            scratch: Vec::with_capacity(key.arity()),
            key,
            groups: ExternalCombinerMap::new(factory, config),
        }
    }
}

impl GroupingExecutor for ExternalGroupingExecutor {
    fn consume(&mut self, row: &[DataValue]) -> Result<(), Error> {
        self.key.evaluate_into(row, &mut self.scratch);
        self.groups.insert(self.scratch.as_slice(), row)
    }

    fn into_groups(self) -> GroupsT {
        log::debug!(
            "external aggregation spilled {} times ({} bytes), {} groups resident",
            self.groups.spill_count(),
            self.groups.spilled_bytes(),
            self.groups.resident_groups()
        );

        GroupsT::External(ExternalGroups(self.groups.into_merged()))
    }
}

/// The fully merged groups of an [ExternalGroupingExecutor]
#[derive(Debug)]
pub(crate) struct ExternalGroups(MergedEntries<GroupKey, AggregateBufferFactory>);

impl Iterator for ExternalGroups {
    type Item = Result<(GroupKey, AggregateBuffer), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

#[cfg(test)]
mod test {
    use super::ExternalGroupingExecutor;
    use crate::{
        aggregates::{
            buffer::{AggregateBufferFactory, AggregateInput},
            operation::AggregateOperation,
        },
        aggregation::{config::AggregationConfig, executors::GroupingExecutor},
        datavalues::DataValue,
        function::{evaluation::Projection, tree::BoundExpression},
    };
    use test_log::test;

    #[test]
    fn spilled_groups_are_merged() {
        let argument = AggregateInput::Argument(Some(BoundExpression::reference(1)));
        let factory = AggregateBufferFactory::new([
            (AggregateOperation::Average, &argument),
            (AggregateOperation::CountDistinct, &argument),
        ])
        .unwrap();
        let key = Projection::new(&[BoundExpression::reference(0)]).unwrap();
        let config = AggregationConfig::default()
            .with_max_resident_groups(3)
            .with_spill_buckets(2);

        let mut executor = ExternalGroupingExecutor::new(factory.clone(), key, &config);
        for value in 0..200 {
            executor
                .consume(&[DataValue::Integer(value % 10), DataValue::Integer(value % 4)])
                .unwrap();
        }
        assert!(executor.groups.spill_count() > 0);

        let mut groups = executor
            .into_groups()
            .map(|group| group.map(|(key, buffer)| (key.values().to_vec(), factory.evaluate(&buffer))))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        groups.sort();

        assert_eq!(groups.len(), 10);
        // key 1 sees the values 1, 11, 21, ... whose remainders modulo 4 alternate between 1 and 3
        assert_eq!(
            groups[1],
            (
                vec![DataValue::Integer(1)],
                vec![DataValue::double(2.0), DataValue::Integer(2)]
            )
        );
    }
}
