//! Aggregation without grouping expressions

use crate::{
    aggregates::buffer::{AggregateBuffer, AggregateBufferFactory},
    datavalues::DataValue,
    error::Error,
    tabular::GroupKey,
};

use super::{GroupingExecutor, GroupsT};

/// Aggregates the whole partition into a single buffer
///
/// Exactly one group is produced, even for an empty partition.
#[derive(Debug)]
pub(crate) struct NoGroupingExecutor {
    factory: AggregateBufferFactory,
    buffer: AggregateBuffer,
}

impl NoGroupingExecutor {
    pub(crate) fn new(factory: AggregateBufferFactory) -> Self {
        let buffer = factory.create();
        Self { factory, buffer }
    }
}

impl GroupingExecutor for NoGroupingExecutor {
    fn consume(&mut self, row: &[DataValue]) -> Result<(), Error> {
        self.factory.update(&mut self.buffer, row)
    }

    fn into_groups(self) -> GroupsT {
        GroupsT::Single(SingleGroup(Some(self.buffer)))
    }
}

/// The group of a [NoGroupingExecutor], keyed by the empty key
#[derive(Debug)]
pub(crate) struct SingleGroup(Option<AggregateBuffer>);

impl Iterator for SingleGroup {
    type Item = Result<(GroupKey, AggregateBuffer), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.take().map(|buffer| Ok((GroupKey::default(), buffer)))
    }
}

#[cfg(test)]
mod test {
    use super::NoGroupingExecutor;
    use crate::{
        aggregates::{
            buffer::{AggregateBufferFactory, AggregateInput},
            operation::AggregateOperation,
        },
        aggregation::executors::GroupingExecutor,
        datavalues::DataValue,
    };
    use test_log::test;

    #[test]
    fn empty_input_yields_zero_state() {
        let factory = AggregateBufferFactory::new([(
            AggregateOperation::CountStar,
            &AggregateInput::Argument(None),
        )])
        .unwrap();

        let groups = NoGroupingExecutor::new(factory.clone())
            .into_groups()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert!(groups[0].0.is_empty());
        assert_eq!(factory.evaluate(&groups[0].1), vec![DataValue::Integer(0)]);
    }
}
