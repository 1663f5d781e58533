//! List command handler: search (and optionally download) every star of a target list.

use std::collections::HashSet;

use anyhow::{Context, Result};
use starsearch_core::{read_target_list, strip_planet_suffix};
use tracing::{debug, info};

use crate::ProcessExit;
use crate::app::{DownloadProgress, RunContext, Tally, connect};
use crate::cli::ListArgs;
use crate::output;

pub async fn run_list_command(ctx: &RunContext, args: &ListArgs) -> Result<ProcessExit> {
    let targets = load_targets(&args.file)?;
    let first = targets
        .first()
        .context("Target list contains no usable names")?;
    let template = ctx.criteria_for(first, &args.filters)?;
    info!(targets = targets.len(), file = %args.file.display(), "searching target list");

    let search = connect(ctx).await?;
    let results = search.search_targets(&targets, &template).await;
    let output_dir = ctx.output_dir_for(args.output_dir.as_deref());

    let progress = DownloadProgress::new(args.download && ctx.show_progress);
    let mut tally = Tally::default();
    for entry in &results {
        progress.println(&output::target_header(&entry.target));
        let records = match &entry.result {
            Ok(records) => records,
            Err(error) => {
                tally.record(false);
                progress.println(&format!("Star not found in archive: {error}"));
                continue;
            }
        };

        if records.is_empty() {
            progress.println("No spectra match the search filters.");
        } else {
            for line in output::render_spectra_table(records) {
                progress.println(&line);
            }
        }

        if args.download {
            let report = search
                .download(records, output_dir, args.overwrite, |event| {
                    progress.observe(&event);
                })
                .await;
            progress.println(&output::download_summary(&report));
            for line in output::render_failures(&report) {
                progress.println(&line);
            }
            tally.record_target([&report]);
        } else {
            tally.record(true);
        }
    }
    progress.finish();
    Ok(tally.outcome())
}

/// Target names with planet designations stripped, first occurrence kept.
fn load_targets(path: &std::path::Path) -> Result<Vec<String>> {
    let names = read_target_list(path)?;
    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(names.len());
    for name in names {
        let star = strip_planet_suffix(&name);
        if seen.insert(star.clone()) {
            targets.push(star);
        } else {
            debug!(name = %name, star = %star, "duplicate target skipped");
        }
    }
    Ok(targets)
}
