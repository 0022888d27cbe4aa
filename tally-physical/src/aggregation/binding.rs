//! This module resolves the grouping expressions and the output list of an aggregation
//! against the schema of its input.
//!
//! Every aggregate call in the output list becomes a [ComputedAggregate]
//! with its own [ExpressionId].
//! The output list itself is rewritten into [ResultExpression]s,
//! in which aggregate calls are replaced by the placeholder of their computed value
//! and grouping expressions by the attribute of the group key.
//! Result expressions can therefore be evaluated from a group key and
//! the evaluated aggregate buffer alone.

use std::fmt;

use itertools::Itertools;

use crate::{
    aggregates::buffer::AggregateInput,
    error::Error,
    function::tree::{AggregateCall, BoundExpression, Expression, FunctionLeaf, FunctionTree},
    tabular::Schema,
};

use super::distribution::{AggregateMode, Distribution};

/// Identifier of an aggregate call in the output list
///
/// Ids are assigned in the order in which the calls occur in the output list,
/// traversing each expression depth first from left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(usize);

impl ExpressionId {
    /// Return the position of the aggregate in the aggregate buffer.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Synthetic column standing for the computed value of an aggregate call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    id: ExpressionId,
    name: String,
}

impl Placeholder {
    fn new(id: ExpressionId) -> Self {
        Self {
            id,
            name: format!("_agg{}", id.0),
        }
    }

    /// Return the id of the aggregate this placeholder stands for.
    pub fn id(&self) -> ExpressionId {
        self.id
    }

    /// Return the column name of this placeholder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the names of the intermediate state columns of this aggregate
    /// in the output of a partial aggregation.
    fn state_columns(&self, width: usize) -> impl Iterator<Item = String> + '_ {
        (0..width).map(move |column| format!("{}.{column}", self.name))
    }
}

/// An aggregate call of the output list together with its resolved input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedAggregate {
    /// Id of the call, which is also its position in the aggregate buffer
    pub id: ExpressionId,
    /// The call as written in the output list
    pub unbound: AggregateCall<String>,
    /// Input of the accumulator,
    /// either the bound argument or the columns of the intermediate state
    pub bound: AggregateInput,
    /// Column naming the computed value
    pub placeholder: Placeholder,
}

/// Reference inside a [ResultExpression]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultReference {
    /// Value of the grouping expression at the given position
    GroupKey(usize),
    /// Computed value of the aggregate with the given id
    Aggregate(ExpressionId),
}

impl fmt::Display for ResultReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultReference::GroupKey(index) => write!(f, "_key{index}"),
            ResultReference::Aggregate(id) => write!(f, "_agg{}", id.0),
        }
    }
}

/// Output expression that only depends on the group key and the computed aggregates
pub type ResultExpression = FunctionTree<ResultReference>;

/// Entry of the output list of an aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedExpression {
    /// Name of the output column
    pub name: String,
    /// Expression computing the output column
    pub expression: Expression,
}

impl NamedExpression {
    /// Create a new [NamedExpression].
    pub fn new<S: Into<String>>(name: S, expression: Expression) -> Self {
        Self {
            name: name.into(),
            expression,
        }
    }
}

/// Result of binding an aggregation to its input schema
#[derive(Debug, Clone)]
pub struct AggregateBinding {
    mode: AggregateMode,
    group_attributes: Vec<String>,
    key_expressions: Vec<BoundExpression>,
    aggregates: Vec<ComputedAggregate>,
    results: Vec<(String, ResultExpression)>,
    output_schema: Schema,
}

impl AggregateBinding {
    /// Bind the grouping expressions and the output list to `input`.
    ///
    /// For [AggregateMode::Final], `grouping` and `outputs` are the same
    /// as for the preceding partial aggregation and `input` must be its output schema.
    ///
    /// # Errors
    /// * [Error::UnresolvedColumn] if a column does not exist in `input`
    /// * [Error::UngroupedColumn] if a column occurs outside an aggregate call
    ///   and outside a grouping expression
    /// * [Error::NestedAggregate] if an aggregate call occurs inside another one
    ///   or inside a grouping expression
    /// * [Error::PartialSchemaMismatch] if, in final mode,
    ///   `input` differs from the output of the partial aggregation
    pub fn bind(
        mode: AggregateMode,
        grouping: &[Expression],
        outputs: &[NamedExpression],
        input: &Schema,
    ) -> Result<Self, Error> {
        if let Some(nested) = grouping.iter().find(|expression| expression.contains_aggregate()) {
            return Err(Error::NestedAggregate(nested.to_string()));
        }

        let group_attributes = grouping
            .iter()
            .enumerate()
            .map(|(index, expression)| match expression {
                FunctionTree::Leaf(FunctionLeaf::Reference(column)) => column.clone(),
                _ => format!("_group{index}"),
            })
            .collect::<Vec<_>>();

        let key_expressions = match mode {
            AggregateMode::Final => (0..grouping.len()).map(BoundExpression::reference).collect(),
            AggregateMode::Partial | AggregateMode::Complete => grouping
                .iter()
                .map(|expression| expression.bind(input))
                .collect::<Result<Vec<_>, Error>>()?,
        };

        let mut rewriter = Rewriter {
            mode,
            grouping,
            input,
            aggregates: Vec::new(),
            next_state_column: grouping.len(),
        };

        let results = outputs
            .iter()
            .map(|output| Ok((output.name.clone(), rewriter.rewrite(&output.expression)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        let aggregates = rewriter.aggregates;

        let partial_schema = Schema::new(
            group_attributes.iter().cloned().chain(aggregates.iter().flat_map(|aggregate| {
                aggregate
                    .placeholder
                    .state_columns(aggregate.unbound.operation.state_width())
                    .collect::<Vec<_>>()
            })),
        );

        if mode == AggregateMode::Final && input != &partial_schema {
            return Err(Error::PartialSchemaMismatch {
                expected: partial_schema.to_string(),
                found: input.to_string(),
            });
        }

        let output_schema = match mode {
            AggregateMode::Partial => partial_schema,
            AggregateMode::Final | AggregateMode::Complete => {
                Schema::new(results.iter().map(|(name, _)| name.clone()))
            }
        };

        log::trace!(
            "bound {} aggregates: {}",
            aggregates.len(),
            aggregates
                .iter()
                .map(|aggregate| format!(
                    "{} = {}",
                    aggregate.placeholder.name(),
                    FunctionTree::Aggregate(aggregate.unbound.clone())
                ))
                .join(", ")
        );

        Ok(Self {
            mode,
            group_attributes,
            key_expressions,
            aggregates,
            results,
            output_schema,
        })
    }

    /// Return the stage this binding was created for.
    pub fn mode(&self) -> AggregateMode {
        self.mode
    }

    /// Return the names of the group key attributes.
    pub fn group_attributes(&self) -> &[String] {
        &self.group_attributes
    }

    /// Return the expressions computing the group key from an input row.
    pub fn key_expressions(&self) -> &[BoundExpression] {
        &self.key_expressions
    }

    /// Return the computed aggregates in id order.
    pub fn aggregates(&self) -> &[ComputedAggregate] {
        &self.aggregates
    }

    /// Return the placeholder of the aggregate with the given id.
    pub fn placeholder(&self, id: ExpressionId) -> Option<&Placeholder> {
        self.aggregates
            .get(id.0)
            .map(|aggregate| &aggregate.placeholder)
    }

    /// Return the rewritten output list.
    pub fn results(&self) -> &[(String, ResultExpression)] {
        &self.results
    }

    /// Return the schema of the rows produced by the aggregation.
    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Return the distribution the input of the aggregation must have.
    pub fn required_input_distribution(&self) -> Distribution {
        match self.mode {
            AggregateMode::Partial => Distribution::UnspecifiedDistribution,
            AggregateMode::Final | AggregateMode::Complete if self.key_expressions.is_empty() => {
                Distribution::SinglePartition
            }
            AggregateMode::Final | AggregateMode::Complete => {
                Distribution::HashPartitioned(self.key_expressions.clone())
            }
        }
    }
}

/// Rewrites output expressions while collecting their aggregate calls
struct Rewriter<'a> {
    mode: AggregateMode,
    grouping: &'a [Expression],
    input: &'a Schema,
    aggregates: Vec<ComputedAggregate>,
    next_state_column: usize,
}

impl Rewriter<'_> {
    fn rewrite(&mut self, expression: &Expression) -> Result<ResultExpression, Error> {
        if let Some(index) = self
            .grouping
            .iter()
            .position(|grouping| grouping == expression)
        {
            return Ok(ResultExpression::reference(ResultReference::GroupKey(index)));
        }

        Ok(match expression {
            FunctionTree::Leaf(FunctionLeaf::Constant(constant)) => {
                ResultExpression::constant(constant.clone())
            }
            FunctionTree::Leaf(FunctionLeaf::Reference(column)) => {
                if self.mode != AggregateMode::Final {
                    self.input.resolve(column)?;
                }

                return Err(Error::UngroupedColumn(column.clone()));
            }
            FunctionTree::Unary(function, sub) => {
                FunctionTree::Unary(*function, Box::new(self.rewrite(sub)?))
            }
            FunctionTree::Binary {
                function,
                left,
                right,
            } => FunctionTree::Binary {
                function: *function,
                left: Box::new(self.rewrite(left)?),
                right: Box::new(self.rewrite(right)?),
            },
            FunctionTree::Aggregate(call) => {
                ResultExpression::reference(ResultReference::Aggregate(self.compute(call)?))
            }
        })
    }

    fn compute(&mut self, call: &AggregateCall<String>) -> Result<ExpressionId, Error> {
        if call
            .argument
            .as_ref()
            .is_some_and(|argument| argument.contains_aggregate())
        {
            return Err(Error::NestedAggregate(
                FunctionTree::Aggregate(call.clone()).to_string(),
            ));
        }

        let bound = match self.mode {
            AggregateMode::Final => {
                let start = self.next_state_column;
                self.next_state_column += call.operation.state_width();

                AggregateInput::State(start..self.next_state_column)
            }
            AggregateMode::Partial | AggregateMode::Complete => AggregateInput::Argument(
                call.argument
                    .as_ref()
                    .map(|argument| argument.bind(self.input))
                    .transpose()?,
            ),
        };

        let id = ExpressionId(self.aggregates.len());
        self.aggregates.push(ComputedAggregate {
            id,
            unbound: call.clone(),
            bound,
            placeholder: Placeholder::new(id),
        });

        Ok(id)
    }
}

#[cfg(test)]
mod test {
    use super::{AggregateBinding, ExpressionId, NamedExpression, ResultExpression, ResultReference};
    use crate::{
        aggregates::buffer::AggregateInput,
        aggregation::distribution::{AggregateMode, Distribution},
        error::Error,
        function::tree::{BoundExpression, Expression},
        tabular::Schema,
    };
    use test_log::test;

    fn schema() -> Schema {
        Schema::new(["k", "v"])
    }

    fn modulo() -> Expression {
        Expression::numeric_remainder(Expression::column("v"), Expression::constant(2))
    }

    fn outputs() -> Vec<NamedExpression> {
        vec![
            NamedExpression::new("parity", modulo()),
            NamedExpression::new(
                "ratio",
                Expression::numeric_division(
                    Expression::sum(Expression::column("v")),
                    Expression::count_star(),
                ),
            ),
            NamedExpression::new("total", Expression::sum(Expression::column("v"))),
        ]
    }

    #[test]
    fn aggregates_are_numbered_in_order() {
        let binding =
            AggregateBinding::bind(AggregateMode::Complete, &[modulo()], &outputs(), &schema())
                .unwrap();

        let ids = binding
            .aggregates()
            .iter()
            .map(|aggregate| (aggregate.id, aggregate.placeholder.name().to_string()))
            .collect::<Vec<_>>();

        // the duplicate sum(v) is computed twice
        assert_eq!(
            ids,
            vec![
                (ExpressionId(0), "_agg0".to_string()),
                (ExpressionId(1), "_agg1".to_string()),
                (ExpressionId(2), "_agg2".to_string())
            ]
        );
        assert_eq!(
            binding.aggregates()[0].bound,
            AggregateInput::Argument(Some(BoundExpression::reference(1)))
        );
        assert_eq!(binding.aggregates()[1].bound, AggregateInput::Argument(None));
        assert_eq!(
            binding.placeholder(ExpressionId(2)).map(|placeholder| placeholder.name()),
            Some("_agg2")
        );
    }

    #[test]
    fn results_reference_key_and_placeholders() {
        let binding =
            AggregateBinding::bind(AggregateMode::Complete, &[modulo()], &outputs(), &schema())
                .unwrap();

        assert_eq!(binding.group_attributes(), ["_group0".to_string()]);
        assert_eq!(
            binding.results()[0].1,
            ResultExpression::reference(ResultReference::GroupKey(0))
        );
        assert_eq!(
            binding.results()[1].1,
            ResultExpression::numeric_division(
                ResultExpression::reference(ResultReference::Aggregate(ExpressionId(0))),
                ResultExpression::reference(ResultReference::Aggregate(ExpressionId(1))),
            )
        );
        assert_eq!(
            binding.output_schema(),
            &Schema::new(["parity", "ratio", "total"])
        );
    }

    #[test]
    fn partial_layout_and_distribution() {
        let grouping = [Expression::column("k")];
        let outputs = [
            NamedExpression::new("k", Expression::column("k")),
            NamedExpression::new("mean", Expression::average(Expression::column("v"))),
        ];

        let partial =
            AggregateBinding::bind(AggregateMode::Partial, &grouping, &outputs, &schema()).unwrap();
        assert_eq!(
            partial.output_schema(),
            &Schema::new(["k", "_agg0.0", "_agg0.1"])
        );
        assert_eq!(
            partial.required_input_distribution(),
            Distribution::UnspecifiedDistribution
        );

        let last = AggregateBinding::bind(
            AggregateMode::Final,
            &grouping,
            &outputs,
            partial.output_schema(),
        )
        .unwrap();
        assert_eq!(last.aggregates()[0].bound, AggregateInput::State(1..3));
        assert_eq!(last.output_schema(), &Schema::new(["k", "mean"]));
        assert_eq!(
            last.required_input_distribution(),
            Distribution::HashPartitioned(vec![BoundExpression::reference(0)])
        );

        assert!(matches!(
            AggregateBinding::bind(AggregateMode::Final, &grouping, &outputs, &schema()),
            Err(Error::PartialSchemaMismatch { .. })
        ));
    }

    #[test]
    fn ungrouped_aggregation_needs_single_partition() {
        let outputs = [NamedExpression::new("n", Expression::count_star())];
        let binding =
            AggregateBinding::bind(AggregateMode::Complete, &[], &outputs, &schema()).unwrap();

        assert_eq!(
            binding.required_input_distribution(),
            Distribution::SinglePartition
        );
    }

    #[test]
    fn binding_errors() {
        let unknown = [NamedExpression::new(
            "s",
            Expression::sum(Expression::column("w")),
        )];
        assert!(matches!(
            AggregateBinding::bind(AggregateMode::Complete, &[], &unknown, &schema()),
            Err(Error::UnresolvedColumn { column, .. }) if column == "w"
        ));

        let ungrouped = [NamedExpression::new("v", Expression::column("v"))];
        assert!(matches!(
            AggregateBinding::bind(
                AggregateMode::Complete,
                &[Expression::column("k")],
                &ungrouped,
                &schema()
            ),
            Err(Error::UngroupedColumn(column)) if column == "v"
        ));

        let nested = [NamedExpression::new(
            "s",
            Expression::sum(Expression::max(Expression::column("v"))),
        )];
        assert!(matches!(
            AggregateBinding::bind(AggregateMode::Complete, &[], &nested, &schema()),
            Err(Error::NestedAggregate(_))
        ));

        let grouped_aggregate = [Expression::count_star()];
        assert!(matches!(
            AggregateBinding::bind(AggregateMode::Complete, &grouped_aggregate, &[], &schema()),
            Err(Error::NestedAggregate(_))
        ));
    }
}
