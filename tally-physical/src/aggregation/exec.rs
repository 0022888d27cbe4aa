//! This module defines [AggregateExec], the physical plan node of an aggregation,
//! and [AggregateStream], which runs it on one input partition.

use std::{fmt, sync::Arc};

use crate::{
    aggregates::buffer::AggregateBufferFactory,
    datavalues::DataValue,
    error::Error,
    function::{evaluation::Projection, tree::Expression},
    tabular::{Row, Schema},
};

use super::{
    binding::{AggregateBinding, NamedExpression},
    config::AggregationConfig,
    distribution::{AggregateMode, Distribution},
    executors::{
        external_grouping::ExternalGroupingExecutor, hash_grouping::HashGroupingExecutor,
        no_grouping::NoGroupingExecutor, AggregateStrategy, GroupingExecutor, GroupingExecutorT,
        GroupsT,
    },
    materialize::ResultMaterializer,
};

/// Everything an [AggregateStream] needs, shared by all partitions
#[derive(Debug)]
struct AggregatePlan {
    binding: AggregateBinding,
    strategy: AggregateStrategy,
    config: AggregationConfig,
    factory: AggregateBufferFactory,
    key: Projection,
    materializer: ResultMaterializer,
}

impl AggregatePlan {
    fn executor(&self) -> GroupingExecutorT {
        match self.strategy {
            AggregateStrategy::NoGrouping => NoGroupingExecutor::new(self.factory.clone()).into(),
            AggregateStrategy::Hash => {
                HashGroupingExecutor::new(self.factory.clone(), self.key.clone()).into()
            }
            AggregateStrategy::External => {
                ExternalGroupingExecutor::new(self.factory.clone(), self.key.clone(), &self.config)
                    .into()
            }
        }
    }
}

/// Physical plan node computing aggregates per group
///
/// The node is bound to its input schema once, on construction.
/// It can then be executed on any number of input partitions,
/// which must be distributed according to [AggregateExec::required_input_distribution].
#[derive(Debug, Clone)]
pub struct AggregateExec {
    plan: Arc<AggregatePlan>,
}

impl AggregateExec {
    /// Create a new aggregation over rows of the schema `input`.
    ///
    /// Without grouping expressions, [AggregateStrategy::NoGrouping] is used regardless of `strategy`.
    /// With grouping expressions, [AggregateStrategy::NoGrouping] falls back to [AggregateStrategy::Hash].
    ///
    /// # Errors
    /// Returns an error if the expressions cannot be bound to `input`,
    /// see [AggregateBinding::bind].
    pub fn try_new(
        mode: AggregateMode,
        strategy: AggregateStrategy,
        grouping: &[Expression],
        outputs: &[NamedExpression],
        input: &Schema,
        config: AggregationConfig,
    ) -> Result<Self, Error> {
        let binding = AggregateBinding::bind(mode, grouping, outputs, input)?;

        let strategy = match (strategy, grouping.is_empty()) {
            (_, true) => AggregateStrategy::NoGrouping,
            (AggregateStrategy::NoGrouping, false) => AggregateStrategy::Hash,
            (strategy, false) => strategy,
        };

        let factory = AggregateBufferFactory::new(
            binding
                .aggregates()
                .iter()
                .map(|aggregate| (aggregate.unbound.operation, &aggregate.bound)),
        )?;
        let key = Projection::new(binding.key_expressions())?;
        let materializer = ResultMaterializer::new(&binding)?;

        log::info!(
            "{mode:?} aggregation of {} aggregates over [{input}] grouped by {} expressions using {strategy:?} strategy",
            factory.len(),
            grouping.len(),
        );

        Ok(Self {
            plan: Arc::new(AggregatePlan {
                binding,
                strategy,
                config,
                factory,
                key,
                materializer,
            }),
        })
    }

    /// Return the stage of the aggregation.
    pub fn mode(&self) -> AggregateMode {
        self.plan.binding.mode()
    }

    /// Return the grouping strategy that is actually used.
    pub fn strategy(&self) -> AggregateStrategy {
        self.plan.strategy
    }

    /// Return the binding of the aggregation to its input.
    pub fn binding(&self) -> &AggregateBinding {
        &self.plan.binding
    }

    /// Return the distribution the input partitions must have.
    pub fn required_input_distribution(&self) -> Distribution {
        self.plan.binding.required_input_distribution()
    }

    /// Return the schema of the produced rows.
    pub fn output_schema(&self) -> &Schema {
        self.plan.binding.output_schema()
    }

    /// Aggregate one input partition.
    ///
    /// Nothing happens until the returned stream is polled for the first time.
    pub fn execute<Rows>(&self, rows: Rows) -> AggregateStream<Rows::IntoIter>
    where
        Rows: IntoIterator<Item = Row>,
    {
        AggregateStream {
            state: StreamState::Consuming {
                input: rows.into_iter(),
                executor: self.plan.executor(),
            },
            plan: Arc::clone(&self.plan),
            scratch: Vec::new(),
        }
    }
}

/// Phase of an [AggregateStream]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Input has not been consumed yet
    Consuming,
    /// Input has been consumed and groups are being emitted
    Emitting,
    /// All groups have been emitted or an error occurred
    Done,
}

enum StreamState<Input> {
    Consuming {
        input: Input,
        executor: GroupingExecutorT,
    },
    Emitting(GroupsT),
    Done,
}

/// Output rows of an [AggregateExec] for one input partition
///
/// The first call to [Iterator::next] consumes the complete input.
/// Afterwards, one row per group is produced lazily, in no particular order.
/// After an error, the stream ends.
pub struct AggregateStream<Input> {
    plan: Arc<AggregatePlan>,
    state: StreamState<Input>,
    scratch: Vec<DataValue>,
}

impl<Input> fmt::Debug for AggregateStream<Input> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateStream")
            .field("phase", &self.phase())
            .field("strategy", &self.plan.strategy)
            .finish()
    }
}

impl<Input> AggregateStream<Input> {
    /// Return the current phase of this stream.
    pub fn phase(&self) -> StreamPhase {
        match self.state {
            StreamState::Consuming { .. } => StreamPhase::Consuming,
            StreamState::Emitting(_) => StreamPhase::Emitting,
            StreamState::Done => StreamPhase::Done,
        }
    }
}

impl<Input> Iterator for AggregateStream<Input>
where
    Input: Iterator<Item = Row>,
{
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, StreamState::Done) {
                StreamState::Consuming {
                    input,
                    mut executor,
                } => {
                    let mut rows = 0usize;
                    for row in input {
                        if let Err(error) = executor.consume(&row) {
                            log::debug!("aggregation failed after {rows} rows: {error}");
                            return Some(Err(error));
                        }
                        rows += 1;
                    }

                    log::debug!("consumed {rows} rows, emitting groups");
                    self.state = StreamState::Emitting(executor.into_groups());
                }
                StreamState::Emitting(mut groups) => {
                    return match groups.next() {
                        Some(Ok((key, buffer))) => {
                            let row = self.plan.materializer.materialize(
                                &self.plan.factory,
                                &key,
                                &buffer,
                                &mut self.scratch,
                            );
                            self.state = StreamState::Emitting(groups);

                            Some(Ok(row))
                        }
                        Some(Err(error)) => Some(Err(error)),
                        None => {
                            log::debug!("all groups emitted");
                            None
                        }
                    };
                }
                StreamState::Done => return None,
            }
        }
    }
}
