//! This module turns the (group key, aggregate buffer) pairs of an aggregation into output rows.

use crate::{
    aggregates::buffer::{AggregateBuffer, AggregateBufferFactory},
    datavalues::DataValue,
    error::Error,
    function::evaluation::Projection,
    tabular::{GroupKey, Row},
};

use super::{
    binding::{AggregateBinding, ResultReference},
    distribution::AggregateMode,
};

/// Produces the output row of a group
#[derive(Debug, Clone)]
pub(crate) enum ResultMaterializer {
    /// Emits the group key followed by the intermediate states
    States,
    /// Evaluates the result expressions over the group key followed by the aggregate values
    Results(Projection),
}

impl ResultMaterializer {
    pub(crate) fn new(binding: &AggregateBinding) -> Result<Self, Error> {
        if binding.mode() == AggregateMode::Partial {
            return Ok(Self::States);
        }

        let key_length = binding.key_expressions().len();
        let bound = binding
            .results()
            .iter()
            .map(|(_, result)| {
                result.try_map_references(&mut |reference: &ResultReference| {
                    Ok(match reference {
                        ResultReference::GroupKey(index) => *index,
                        ResultReference::Aggregate(id) => key_length + id.index(),
                    })
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self::Results(Projection::new(&bound)?))
    }

    /// Compute the output row of the given group.
    ///
    /// `scratch` is overwritten and may be reused between calls.
    pub(crate) fn materialize(
        &self,
        factory: &AggregateBufferFactory,
        key: &GroupKey,
        buffer: &AggregateBuffer,
        scratch: &mut Vec<DataValue>,
    ) -> Row {
        scratch.clear();
        scratch.extend_from_slice(key.values());

        match self {
            ResultMaterializer::States => {
                scratch.extend(factory.state(buffer));
                Row::new(scratch.clone())
            }
            ResultMaterializer::Results(projection) => {
                scratch.extend(factory.evaluate(buffer));
                Row::new(projection.evaluate(scratch))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::ResultMaterializer;
    use crate::{
        aggregates::buffer::AggregateBufferFactory,
        aggregation::{
            binding::{AggregateBinding, NamedExpression},
            distribution::AggregateMode,
        },
        datavalues::DataValue,
        function::tree::Expression,
        tabular::{GroupKey, Row, Schema},
    };
    use test_log::test;

    #[test]
    fn results_and_states() {
        let schema = Schema::new(["k", "v"]);
        let grouping = [Expression::column("k")];
        let outputs = [
            NamedExpression::new(
                "doubled",
                Expression::numeric_multiplication(Expression::column("k"), Expression::constant(2)),
            ),
            NamedExpression::new("mean", Expression::average(Expression::column("v"))),
        ];

        let mut scratch = Vec::new();
        let key = GroupKey::from([DataValue::Integer(4)].as_slice());

        for (mode, expected) in [
            (
                AggregateMode::Complete,
                Row::new(vec![DataValue::Integer(8), DataValue::double(2.5)]),
            ),
            (
                AggregateMode::Partial,
                Row::new(vec![
                    DataValue::Integer(4),
                    DataValue::Integer(5),
                    DataValue::Integer(2),
                ]),
            ),
        ] {
            let binding = AggregateBinding::bind(mode, &grouping, &outputs, &schema).unwrap();
            let factory = AggregateBufferFactory::new(
                binding
                    .aggregates()
                    .iter()
                    .map(|aggregate| (aggregate.unbound.operation, &aggregate.bound)),
            )
            .unwrap();

            let mut buffer = factory.create();
            for value in [2, 3] {
                factory
                    .update(&mut buffer, &[DataValue::Integer(4), DataValue::Integer(value)])
                    .unwrap();
            }

            let materializer = ResultMaterializer::new(&binding).unwrap();
            assert_eq!(
                materializer.materialize(&factory, &key, &buffer, &mut scratch),
                expected
            );
        }
    }
}
