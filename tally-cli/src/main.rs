/*!
  Binary for the CLI of tally: tally
*/

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

use clap::Parser;
use colored::Colorize;
use tally_cli::{
    cli::CliApp,
    driver::AggregationRequest,
    error::CliError,
    table::{read_csv, write_csv},
};

fn run(cli: CliApp) -> Result<(), CliError> {
    let request = AggregationRequest::new(
        &cli.group_by,
        &cli.aggregates,
        cli.execution.strategy.into(),
        cli.execution.config(),
        usize::from(cli.execution.partitions),
    )?;

    let (schema, rows) = read_csv(&cli.input)?;

    log::info!("Aggregating ...");
    let (output_schema, mut output) = request.run(&schema, rows)?;
    log::info!("Aggregation done, {} groups", output.len());

    // groups come out in hash order
    output.sort();

    write_csv(std::io::stdout().lock(), &output_schema, &output)
}

fn main() {
    let cli = CliApp::parse();

    cli.logging.initialize_logging();
    log::info!("Version: {}", clap::crate_version!());
    log::debug!("Input file: {}", cli.input.display());

    run(cli).unwrap_or_else(|err| {
        log::error!("{} {err}", "error:".red().bold());
        std::process::exit(1)
    })
}
