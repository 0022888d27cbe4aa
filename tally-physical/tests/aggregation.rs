use quickcheck_macros::quickcheck;
use tally_physical::{
    aggregation::{
        AggregateExec, AggregateMode, AggregateStrategy, AggregationConfig, NamedExpression,
        StreamPhase,
    },
    datavalues::DataValue,
    error::Error,
    function::tree::Expression,
    tabular::{Row, Schema},
};
use test_log::test;

fn schema() -> Schema {
    Schema::new(["k", "v"])
}

fn rows(pairs: &[(i64, Option<i64>)]) -> Vec<Row> {
    pairs
        .iter()
        .map(|(key, value)| {
            Row::new(vec![
                DataValue::Integer(*key),
                value.map_or(DataValue::Null, DataValue::Integer),
            ])
        })
        .collect()
}

fn run(exec: &AggregateExec, input: Vec<Row>) -> Result<Vec<Row>, Error> {
    let mut output = exec.execute(input).collect::<Result<Vec<_>, _>>()?;
    output.sort();
    Ok(output)
}

fn grouped_outputs() -> Vec<NamedExpression> {
    vec![
        NamedExpression::new("k", Expression::column("k")),
        NamedExpression::new("n", Expression::count_star()),
        NamedExpression::new("values", Expression::count(Expression::column("v"))),
        NamedExpression::new("total", Expression::sum(Expression::column("v"))),
        NamedExpression::new("mean", Expression::average(Expression::column("v"))),
        NamedExpression::new("low", Expression::min(Expression::column("v"))),
        NamedExpression::new("high", Expression::max(Expression::column("v"))),
        NamedExpression::new("distinct", Expression::count_distinct(Expression::column("v"))),
        NamedExpression::new(
            "spread",
            Expression::numeric_subtraction(
                Expression::max(Expression::column("v")),
                Expression::min(Expression::column("v")),
            ),
        ),
    ]
}

fn exec(mode: AggregateMode, strategy: AggregateStrategy, config: AggregationConfig) -> AggregateExec {
    AggregateExec::try_new(
        mode,
        strategy,
        &[Expression::column("k")],
        &grouped_outputs(),
        &schema(),
        config,
    )
    .unwrap()
}

fn spilling() -> AggregationConfig {
    AggregationConfig::default()
        .with_max_resident_groups(2)
        .with_spill_buckets(3)
}

/// Reduces arbitrary test input to a small key space, so that groups get more than one row.
fn small_keys(input: &[(u8, Option<i16>)]) -> Vec<Row> {
    let pairs = input
        .iter()
        .map(|(key, value)| (i64::from(key % 7), value.map(i64::from)))
        .collect::<Vec<_>>();
    rows(&pairs)
}

#[test]
fn sum_by_key() {
    let exec = AggregateExec::try_new(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        &[Expression::column("k")],
        &[
            NamedExpression::new("k", Expression::column("k")),
            NamedExpression::new("total", Expression::sum(Expression::column("v"))),
        ],
        &schema(),
        AggregationConfig::default(),
    )
    .unwrap();

    let output = run(&exec, rows(&[(1, Some(10)), (1, Some(20)), (2, Some(5))])).unwrap();

    assert_eq!(exec.output_schema(), &Schema::new(["k", "total"]));
    assert_eq!(
        output,
        vec![
            Row::new(vec![DataValue::Integer(1), DataValue::Integer(30)]),
            Row::new(vec![DataValue::Integer(2), DataValue::Integer(5)]),
        ]
    );
}

#[test]
fn empty_partition_counts_zero() {
    let exec = AggregateExec::try_new(
        AggregateMode::Complete,
        AggregateStrategy::External,
        &[],
        &[NamedExpression::new("n", Expression::count_star())],
        &schema(),
        AggregationConfig::default(),
    )
    .unwrap();

    assert_eq!(exec.strategy(), AggregateStrategy::NoGrouping);
    assert_eq!(
        run(&exec, Vec::new()).unwrap(),
        vec![Row::new(vec![DataValue::Integer(0)])]
    );
}

#[test]
fn group_by_parity() {
    let parity = Expression::numeric_remainder(Expression::column("v"), Expression::constant(2));
    let exec = AggregateExec::try_new(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        &[parity.clone()],
        &[
            NamedExpression::new("parity", parity),
            NamedExpression::new("n", Expression::count_star()),
        ],
        &schema(),
        AggregationConfig::default(),
    )
    .unwrap();

    let input = rows(&[(0, Some(1)), (0, Some(2)), (0, Some(3)), (0, Some(4))]);

    assert_eq!(
        run(&exec, input).unwrap(),
        vec![
            Row::new(vec![DataValue::Integer(0), DataValue::Integer(2)]),
            Row::new(vec![DataValue::Integer(1), DataValue::Integer(2)]),
        ]
    );
}

#[test]
fn stream_is_two_phase() {
    let exec = exec(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        AggregationConfig::default(),
    );
    let mut stream = exec.execute(rows(&[(1, Some(1)), (2, Some(2))]));

    assert_eq!(stream.phase(), StreamPhase::Consuming);
    assert!(stream.next().is_some());
    assert_eq!(stream.phase(), StreamPhase::Emitting);
    assert!(stream.next().is_some());
    assert!(stream.next().is_none());
    assert_eq!(stream.phase(), StreamPhase::Done);
    assert!(stream.next().is_none());
}

#[test]
fn overflow_ends_the_stream() {
    let exec = exec(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        AggregationConfig::default(),
    );
    let mut stream = exec.execute(rows(&[(1, Some(i64::MAX)), (1, Some(1))]));

    assert!(matches!(stream.next(), Some(Err(Error::IntegerOverflow(_)))));
    assert_eq!(stream.phase(), StreamPhase::Done);
    assert!(stream.next().is_none());
}

#[test]
fn extremes_compare_numerically() {
    let exec = AggregateExec::try_new(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        &[],
        &[
            NamedExpression::new("low", Expression::min(Expression::column("v"))),
            NamedExpression::new("high", Expression::max(Expression::column("v"))),
        ],
        &schema(),
        AggregationConfig::default(),
    )
    .unwrap();

    let input = [
        DataValue::Integer(10),
        DataValue::double(0.5),
        DataValue::double(2.5),
    ]
    .into_iter()
    .map(|value| Row::new(vec![DataValue::Integer(0), value]))
    .collect::<Vec<_>>();

    assert_eq!(
        run(&exec, input).unwrap(),
        vec![Row::new(vec![DataValue::double(0.5), DataValue::Integer(10)])]
    );
}

#[test]
fn failed_spill_ends_the_stream() {
    let exec = exec(
        AggregateMode::Complete,
        AggregateStrategy::External,
        AggregationConfig::default()
            .with_max_resident_groups(1)
            .with_spill_directory("/nonexistent/tally-spill"),
    );
    let mut stream = exec.execute(rows(&[(1, Some(1)), (2, Some(2)), (3, Some(3))]));

    assert!(matches!(stream.next(), Some(Err(Error::SpillIo(_)))));
    assert_eq!(stream.phase(), StreamPhase::Done);
    assert!(stream.next().is_none());
}

#[test]
fn binding_errors_surface_on_construction() {
    let result = AggregateExec::try_new(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        &[Expression::column("missing")],
        &[],
        &schema(),
        AggregationConfig::default(),
    );

    assert!(matches!(result, Err(Error::UnresolvedColumn { .. })));
}

#[quickcheck]
#[cfg_attr(miri, ignore)]
fn strategies_agree(input: Vec<(u8, Option<i16>)>) -> bool {
    let input = small_keys(&input);

    let hash = run(
        &exec(AggregateMode::Complete, AggregateStrategy::Hash, AggregationConfig::default()),
        input.clone(),
    )
    .unwrap();
    let external = run(
        &exec(AggregateMode::Complete, AggregateStrategy::External, AggregationConfig::default()),
        input.clone(),
    )
    .unwrap();
    let spilled = run(
        &exec(AggregateMode::Complete, AggregateStrategy::External, spilling()),
        input,
    )
    .unwrap();

    hash == external && hash == spilled
}

#[quickcheck]
#[cfg_attr(miri, ignore)]
fn two_stages_equal_one(input: Vec<(u8, Option<i16>)>, partitions: u8) -> bool {
    let input = small_keys(&input);
    let partitions = usize::from(partitions % 5) + 1;

    let complete = run(
        &exec(AggregateMode::Complete, AggregateStrategy::Hash, AggregationConfig::default()),
        input.clone(),
    )
    .unwrap();

    let partial = exec(AggregateMode::Partial, AggregateStrategy::External, spilling());
    let last = AggregateExec::try_new(
        AggregateMode::Final,
        AggregateStrategy::Hash,
        &[Expression::column("k")],
        &grouped_outputs(),
        partial.output_schema(),
        AggregationConfig::default(),
    )
    .unwrap();

    let mut intermediate = Vec::new();
    for partition in partial
        .required_input_distribution()
        .repartition(input, partitions)
        .unwrap()
    {
        intermediate.extend(run(&partial, partition).unwrap());
    }

    let mut two_stage = Vec::new();
    for partition in last
        .required_input_distribution()
        .repartition(intermediate, partitions)
        .unwrap()
    {
        two_stage.extend(run(&last, partition).unwrap());
    }
    two_stage.sort();

    complete == two_stage
}

#[quickcheck]
#[cfg_attr(miri, ignore)]
fn global_aggregate_has_one_row(input: Vec<(u8, Option<i16>)>) -> bool {
    let input = small_keys(&input);
    let count = i64::try_from(input.len()).unwrap();

    let exec = AggregateExec::try_new(
        AggregateMode::Complete,
        AggregateStrategy::Hash,
        &[],
        &[NamedExpression::new("n", Expression::count_star())],
        &schema(),
        AggregationConfig::default(),
    )
    .unwrap();

    run(&exec, input).unwrap() == vec![Row::new(vec![DataValue::Integer(count)])]
}
