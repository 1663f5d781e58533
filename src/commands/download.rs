//! Download command handler: search and fetch spectra of one or more stars.

use anyhow::Result;
use tracing::{info, warn};

use crate::ProcessExit;
use crate::app::{DownloadProgress, RunContext, Tally, connect};
use crate::cli::DownloadArgs;
use crate::output;

pub async fn run_download_command(ctx: &RunContext, args: &DownloadArgs) -> Result<ProcessExit> {
    let criteria = args
        .stars
        .iter()
        .map(|star| ctx.criteria_for(star, &args.filters))
        .collect::<Result<Vec<_>>>()?;
    let search = connect(ctx).await?;
    let output_dir = ctx.output_dir_for(args.output_dir.as_deref());

    let progress = DownloadProgress::new(ctx.show_progress);
    let mut tally = Tally::default();
    for criteria in &criteria {
        progress.println(&output::target_header(&criteria.target));
        let result = search
            .get_data(criteria, output_dir, args.overwrite, |event| {
                progress.observe(&event);
            })
            .await;
        match result {
            Ok(outcomes) => {
                tally.record_target(outcomes.iter().filter_map(|o| o.report()));
                for line in output::render_instrument_downloads(&outcomes) {
                    progress.println(&line);
                }
            }
            Err(error) => {
                warn!(target = %criteria.target, error = %error, "search failed");
                tally.record(false);
                progress.println(&format!("search failed: {error}"));
            }
        }
    }
    progress.finish();

    info!(
        completed = tally.completed,
        failed = tally.failed,
        output_dir = %output_dir.display(),
        "download run finished"
    );
    Ok(tally.outcome())
}
