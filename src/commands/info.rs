//! Lookup commands: instruments, spectra counts, observation and release dates.

use anyhow::Result;

use crate::ProcessExit;
use crate::app::{RunContext, connect};
use crate::cli::{InstrumentArgs, StarArgs};
use crate::output;

pub async fn run_instruments_command(ctx: &RunContext, args: &StarArgs) -> Result<ProcessExit> {
    let search = connect(ctx).await?;
    let counts = search.search_instruments(&args.star).await?;
    if counts.is_empty() {
        println!("No observations of {} found in the archive.", args.star);
    } else {
        output::print_lines(&output::render_count_table("OBSERVATIONS", &counts));
    }
    Ok(ProcessExit::Success)
}

pub async fn run_spectra_command(ctx: &RunContext, args: &InstrumentArgs) -> Result<ProcessExit> {
    let search = connect(ctx).await?;
    let counts = search
        .search_instrument_spectra(&args.star, args.instrument.as_deref())
        .await?;
    output::print_lines(&output::render_count_table("SPECTRA", &counts));
    Ok(ProcessExit::Success)
}

pub async fn run_dates_command(ctx: &RunContext, args: &InstrumentArgs) -> Result<ProcessExit> {
    let search = connect(ctx).await?;
    let dates = search
        .search_star_dates(&args.star, args.instrument.as_deref())
        .await?;
    if dates.is_empty() {
        println!("No spectra of {} found in the archive.", args.star);
    } else {
        output::print_lines(&output::render_dates(&dates));
    }
    Ok(ProcessExit::Success)
}
