//! Search command handler: list a star's spectra.

use anyhow::{Context, Result};
use tracing::info;

use crate::ProcessExit;
use crate::app::{RunContext, connect};
use crate::cli::SearchArgs;
use crate::output;

pub async fn run_search_command(ctx: &RunContext, args: &SearchArgs) -> Result<ProcessExit> {
    let criteria = ctx.criteria_for(&args.star, &args.filters)?;
    let search = connect(ctx).await?;
    let records = search.search_star(&criteria).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to encode results")?;
        println!("{json}");
        return Ok(ProcessExit::Success);
    }

    if records.is_empty() {
        println!("No spectra of {} match the search filters.", criteria.target);
    } else {
        output::print_lines(&output::render_spectra_table(&records));
        info!(count = records.len(), target = %criteria.target, "search complete");
    }
    Ok(ProcessExit::Success)
}
