//! Contains structures and functionality for the binary
use std::path::PathBuf;

use clap::ArgAction;
use tally_physical::{
    aggregates::operation::AggregateOperation,
    aggregation::{config::DEFAULT_SPILL_BUCKETS, AggregateStrategy, AggregationConfig},
    function::tree::Expression,
};

/// Default memory budget of the external strategy in bytes
const DEFAULT_MEMORY_BUDGET: u64 = tally_physical::aggregation::config::DEFAULT_MEMORY_BUDGET_BYTES;

/// Possible settings for the grouping strategy.
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Keep all groups in memory
    #[default]
    Hash,
    /// Spill groups to disk once the memory budget is exceeded
    External,
}

impl From<Strategy> for AggregateStrategy {
    fn from(val: Strategy) -> Self {
        match val {
            Strategy::Hash => AggregateStrategy::Hash,
            Strategy::External => AggregateStrategy::External,
        }
    }
}

/// Cli Arguments related to logging
#[derive(clap::Args, Debug)]
pub struct LoggingArgs {
    /// Increase log verbosity (multiple uses increase verbosity further)
    #[arg(short, long, action = clap::builder::ArgAction::Count, group = "verbosity")]
    verbose: u8,
    /// Reduce log verbosity to show only errors (equivalent to --log error)
    #[arg(short, long, group = "verbosity")]
    quiet: bool,
    /// Set log verbosity (default is "warn")
    #[arg(long = "log", value_parser=clap::builder::PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"]), group = "verbosity")]
    log_level: Option<String>,
}

impl LoggingArgs {
    /// Initialising Logging
    ///
    /// Sets the logging verbosity to the given log-level in the following order:
    ///  * `Info`, `Debug`, `Trace`; depending on the count of `-v`
    ///  * `Error` when `-q` is used
    ///  * The `TALLY_LOG` environment variable value
    ///  * `Warn` otherwise
    pub fn initialize_logging(&self) {
        let mut builder = env_logger::Builder::new();

        // Default log level
        builder.filter_level(log::LevelFilter::Warn);

        builder.parse_env("TALLY_LOG");
        if let Some(ref level) = self.log_level {
            builder.parse_filters(level);
        } else if self.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if self.verbose > 0 {
            builder.filter_level(match self.verbose {
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                3 => log::LevelFilter::Trace,
                _ => log::LevelFilter::Warn,
            });
        }
        builder.init();
    }
}

/// Cli arguments related to execution
#[derive(clap::Args, Debug)]
pub struct ExecutionArgs {
    /// Strategy used to group rows
    #[arg(short, long, value_enum, default_value_t)]
    pub strategy: Strategy,
    /// Bytes of group state kept in memory per partition before spilling (external strategy)
    #[arg(long = "memory-budget", default_value_t = DEFAULT_MEMORY_BUDGET)]
    pub memory_budget: u64,
    /// Number of groups kept in memory per partition before spilling (external strategy)
    #[arg(long = "max-groups")]
    pub max_groups: Option<usize>,
    /// Number of buckets spilled groups are partitioned into (external strategy)
    #[arg(long = "spill-buckets", default_value_t = DEFAULT_SPILL_BUCKETS)]
    pub spill_buckets: usize,
    /// Directory for spill files (default is the temporary directory of the system)
    #[arg(long = "spill-directory")]
    pub spill_directory: Option<PathBuf>,
    /// Number of partitions; with more than one, a partial and a final stage are run
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub partitions: u16,
}

impl ExecutionArgs {
    /// Returns the configuration of the aggregation operators.
    pub fn config(&self) -> AggregationConfig {
        let mut config = AggregationConfig::default()
            .with_memory_budget_bytes(self.memory_budget)
            .with_spill_buckets(self.spill_buckets);

        if let Some(groups) = self.max_groups {
            config = config.with_max_resident_groups(groups);
        }
        if let Some(directory) = &self.spill_directory {
            config = config.with_spill_directory(directory);
        }

        config
    }
}

/// Grouping expression given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupByArg {
    /// Text of the expression, used as column name of the output
    pub label: String,
    /// Parsed expression
    pub expression: Expression,
}

/// Parse a column name or `column % N`.
fn parse_group_by(s: &str) -> Result<GroupByArg, String> {
    let label = s.trim();

    let expression = match label.split_once('%') {
        Some((column, modulus)) => {
            let modulus = modulus
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid modulus in grouping expression: {s}"))?;

            Expression::numeric_remainder(
                Expression::column(parse_column(column, s)?),
                Expression::constant(modulus),
            )
        }
        None => Expression::column(parse_column(label, s)?),
    };

    Ok(GroupByArg {
        label: label.to_string(),
        expression,
    })
}

fn parse_column<'a>(column: &'a str, argument: &str) -> Result<&'a str, String> {
    let column = column.trim();

    if column.is_empty() || column.contains(['(', ')', '=', '*']) {
        Err(format!("invalid column name in {argument}"))
    } else {
        Ok(column)
    }
}

/// Aggregate given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateArg {
    /// Name of the output column
    pub name: String,
    /// Aggregate call
    pub expression: Expression,
}

/// Parse `NAME=FUNC(ARG)`.
fn parse_aggregate(s: &str) -> Result<AggregateArg, String> {
    let (name, call) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid aggregate, expected NAME=FUNC(ARG): {s}"))?;
    let (function, argument) = call
        .trim()
        .strip_suffix(')')
        .and_then(|call| call.split_once('('))
        .ok_or_else(|| format!("invalid aggregate, expected NAME=FUNC(ARG): {s}"))?;

    let argument = argument.trim();
    let star = argument == "*";
    let operation = AggregateOperation::from_name(function.trim(), star)
        .ok_or_else(|| format!("unsupported aggregate: {}", call.trim()))?;

    let argument = if star {
        None
    } else {
        Some(Expression::column(parse_column(argument, s)?))
    };

    Ok(AggregateArg {
        name: name.trim().to_string(),
        expression: Expression::aggregate(operation, argument),
    })
}

/// tally: grouped aggregation over CSV files
#[derive(clap::Parser, Debug)]
#[command(author, version, about)]
pub struct CliApp {
    /// CSV file with a header row
    #[arg(value_parser)]
    pub input: PathBuf,
    /// Grouping expression: a column name or `column % N`
    #[arg(short, long = "group-by", value_parser = parse_group_by, action = ArgAction::Append)]
    pub group_by: Vec<GroupByArg>,
    /// Aggregate to compute as NAME=FUNC(ARG), where FUNC is one of
    /// count, sum, avg, min, max, count_distinct and ARG a column name, or `*` for count
    #[arg(short, long = "aggregate", value_parser = parse_aggregate, action = ArgAction::Append)]
    pub aggregates: Vec<AggregateArg>,
    /// Arguments related to execution
    #[command(flatten)]
    pub execution: ExecutionArgs,
    /// Arguments related to logging
    #[command(flatten)]
    pub logging: LoggingArgs,
}
