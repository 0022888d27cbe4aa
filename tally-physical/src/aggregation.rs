//! This module contains the aggregation operator:
//! binding an aggregation to its input, the grouping strategies
//! and the stream that ties them together for one input partition.

pub mod binding;
pub mod config;
pub mod distribution;
pub mod exec;
pub(crate) mod executors;
pub(crate) mod materialize;

pub use binding::{AggregateBinding, ComputedAggregate, ExpressionId, NamedExpression};
pub use config::AggregationConfig;
pub use distribution::{AggregateMode, Distribution};
pub use exec::{AggregateExec, AggregateStream, StreamPhase};
pub use executors::AggregateStrategy;
