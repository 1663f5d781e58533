//! CLI output formatting and display helpers.
//!
//! Tables go to stdout; logs go to stderr through tracing.

use std::collections::BTreeMap;
use std::io::IsTerminal;

use starsearch_core::archive::mjd::format_mjd;
use starsearch_core::{DownloadReport, InstrumentDownload, SpectrumDates, SpectrumRecord};

const SPECTRA_HEADERS: [&str; 5] = ["DATASET", "INSTRUMENT", "DATE-OBS", "SNR", "TARGET"];

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// Prints lines to stdout, truncated to the terminal width when stdout is a terminal.
pub fn print_lines(lines: &[String]) {
    let width = std::io::stdout().is_terminal().then(terminal_width);
    for line in lines {
        match width {
            Some(width) => println!("{}", truncate_to_width(line, width)),
            None => println!("{line}"),
        }
    }
}

/// Renders rows as left-aligned columns separated by two spaces.
fn render_columns(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(headers.to_vec()));
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

fn format_snr(snr: Option<f64>) -> String {
    snr.map_or_else(|| "-".to_string(), |value| format!("{value:.1}"))
}

/// Table of spectra, one row per record.
pub fn render_spectra_table(records: &[SpectrumRecord]) -> Vec<String> {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            vec![
                record.dataset_id.clone(),
                record.instrument.trim().to_string(),
                record.date_obs(),
                format_snr(record.snr),
                record.target.clone(),
            ]
        })
        .collect();
    render_columns(&SPECTRA_HEADERS, &rows)
}

/// Two-column table of per-instrument counts.
pub fn render_count_table(count_header: &str, counts: &BTreeMap<String, usize>) -> Vec<String> {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|(instrument, count)| vec![instrument.clone(), count.to_string()])
        .collect();
    render_columns(&["INSTRUMENT", count_header], &rows)
}

/// Observation dates with calendar timestamps and release dates.
pub fn render_dates(dates: &[SpectrumDates]) -> Vec<String> {
    let rows: Vec<Vec<String>> = dates
        .iter()
        .map(|d| {
            vec![
                format!("{:.5}", d.mjd_obs),
                format_mjd(d.mjd_obs),
                d.release_date.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    render_columns(&["MJD", "DATE-OBS", "RELEASE"], &rows)
}

/// One-line summary of a batch download.
pub fn download_summary(report: &DownloadReport) -> String {
    let mut summary = format!(
        "{} downloaded, {} already present",
        report.downloaded.len(),
        report.skipped.len()
    );
    if report.has_failures() {
        summary.push_str(&format!(", {} failed", report.failed.len()));
    }
    summary
}

/// Lines describing a get-data run for one target.
pub fn render_instrument_downloads(outcomes: &[InstrumentDownload]) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in outcomes {
        match outcome {
            InstrumentDownload::NoData { instrument } => {
                lines.push(format!("{instrument}: no data"));
            }
            InstrumentDownload::Fetched {
                instrument,
                found,
                report,
            } => {
                lines.push(format!(
                    "{instrument}: {found} spectra found, {}",
                    download_summary(report)
                ));
                lines.extend(render_failures(report));
            }
        }
    }
    lines
}

/// One indented line per failed dataset.
pub fn render_failures(report: &DownloadReport) -> Vec<String> {
    report
        .failed
        .iter()
        .map(|(dataset_id, error)| format!("  failed {dataset_id}: {error}"))
        .collect()
}

/// Section header for one target of a list.
pub fn target_header(target: &str) -> String {
    format!("*** {target} ***")
}
