//! Runs an aggregation over partitioned input the way a distributed engine would:
//! rows are distributed according to the requirement of each stage,
//! and every partition is aggregated on its own thread.

use tally_physical::{
    aggregation::{
        AggregateExec, AggregateMode, AggregateStrategy, AggregationConfig, NamedExpression,
    },
    error::Error,
    function::tree::Expression,
    tabular::{Row, Schema},
};

use crate::{
    cli::{AggregateArg, GroupByArg},
    error::CliError,
};

/// Aggregation to be run by [AggregationRequest::run]
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    /// Grouping expressions
    pub grouping: Vec<Expression>,
    /// Output list
    pub outputs: Vec<NamedExpression>,
    /// Grouping strategy of every stage
    pub strategy: AggregateStrategy,
    /// Resource limits of every partition
    pub config: AggregationConfig,
    /// Number of partitions
    pub partitions: usize,
}

impl AggregationRequest {
    /// Create a request that outputs the grouping expressions followed by the aggregates.
    pub fn new(
        group_by: &[GroupByArg],
        aggregates: &[AggregateArg],
        strategy: AggregateStrategy,
        config: AggregationConfig,
        partitions: usize,
    ) -> Result<Self, CliError> {
        if group_by.is_empty() && aggregates.is_empty() {
            return Err(CliError::NothingToCompute);
        }

        let outputs = group_by
            .iter()
            .map(|group| NamedExpression::new(&group.label, group.expression.clone()))
            .chain(
                aggregates
                    .iter()
                    .map(|aggregate| NamedExpression::new(&aggregate.name, aggregate.expression.clone())),
            )
            .collect();

        Ok(Self {
            grouping: group_by.iter().map(|group| group.expression.clone()).collect(),
            outputs,
            strategy,
            config,
            partitions: partitions.max(1),
        })
    }

    fn exec(&self, mode: AggregateMode, input: &Schema) -> Result<AggregateExec, Error> {
        AggregateExec::try_new(
            mode,
            self.strategy,
            &self.grouping,
            &self.outputs,
            input,
            self.config.clone(),
        )
    }

    /// Aggregate the given rows.
    ///
    /// With a single partition, one [AggregateMode::Complete] stage is run.
    /// Otherwise, the rows are spread over the partitions, aggregated by an
    /// [AggregateMode::Partial] stage, redistributed as required by the
    /// [AggregateMode::Final] stage, and aggregated again.
    pub fn run(&self, schema: &Schema, rows: Vec<Row>) -> Result<(Schema, Vec<Row>), CliError> {
        if self.partitions == 1 {
            let complete = self.exec(AggregateMode::Complete, schema)?;
            let output = run_stage(&complete, rows, 1)?;

            return Ok((complete.output_schema().clone(), output));
        }

        let partial = self.exec(AggregateMode::Partial, schema)?;
        let last = self.exec(AggregateMode::Final, partial.output_schema())?;

        let intermediate = run_stage(&partial, rows, self.partitions)?;
        log::info!("partial stage produced {} rows", intermediate.len());

        let output = run_stage(&last, intermediate, self.partitions)?;

        Ok((last.output_schema().clone(), output))
    }
}

/// Distribute `rows` as required by `exec` and aggregate every partition on its own thread.
fn run_stage(exec: &AggregateExec, rows: Vec<Row>, partitions: usize) -> Result<Vec<Row>, Error> {
    let distribution = exec.required_input_distribution();
    let partitions = distribution.repartition(rows, partitions)?;

    log::info!(
        "running {:?} stage on {} partitions distributed by {distribution:?}",
        exec.mode(),
        partitions.len()
    );

    std::thread::scope(|scope| {
        let handles = partitions
            .into_iter()
            .map(|partition| {
                scope.spawn(move || exec.execute(partition).collect::<Result<Vec<_>, Error>>())
            })
            .collect::<Vec<_>>();

        let mut output = Vec::new();
        for handle in handles {
            let rows = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
            output.extend(rows);
        }

        Ok(output)
    })
}
