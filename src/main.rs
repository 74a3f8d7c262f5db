use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scenario_frame::data::loader;
use scenario_frame::{Filter, Predicate};

/// Load a file, optionally filter it, and print the wide-by-time view as CSV.
///
/// Filter arguments use the predicate syntax of the library: `*` wildcards,
/// `a|b*` for alternatives, `2005..2020` / `2005..=2020` for year ranges.
#[derive(Parser, Debug)]
#[command(name = "scenario-frame")]
struct Args {
    /// Scenario data file (.csv, .json or .parquet)
    path: PathBuf,

    /// Drop the matching records instead of keeping them
    #[arg(long)]
    drop: bool,

    /// `column=value` predicates, combined with AND
    #[arg(value_parser = parse_filter)]
    filters: Vec<(String, Predicate)>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let frame = loader::load_file(&args.path)?;
    let frame = if args.filters.is_empty() {
        frame
    } else {
        let filter = args
            .filters
            .into_iter()
            .fold(Filter::new().keep(!args.drop), |filter, (column, predicate)| {
                filter.with(column, predicate)
            });
        frame.filter(&filter)?
    };
    log::info!(
        "{} records, {} scenarios, years {:?}",
        frame.len(),
        frame.meta().len(),
        frame.years()
    );

    loader::write_csv(&frame, std::io::stdout().lock())
}

fn parse_filter(arg: &str) -> Result<(String, Predicate)> {
    let (column, value) = arg
        .split_once('=')
        .with_context(|| format!("expected `column=value`, got `{arg}`"))?;
    Ok((column.to_string(), parse_predicate(column, value)?))
}

fn parse_predicate(column: &str, value: &str) -> Result<Predicate> {
    if !column.trim().eq_ignore_ascii_case("year") {
        return Ok(Predicate::alternatives(value));
    }
    let year = |s: &str| {
        s.trim()
            .parse::<i64>()
            .with_context(|| format!("invalid year `{s}`"))
    };
    if let Some((start, end)) = value.split_once("..=") {
        Ok(Predicate::from(year(start)?..=year(end)?))
    } else if let Some((start, end)) = value.split_once("..") {
        Ok(Predicate::from(year(start)?..year(end)?))
    } else {
        Ok(Predicate::years(
            value.split('|').map(year).collect::<Result<Vec<_>>>()?,
        ))
    }
}
