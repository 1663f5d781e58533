//! Local file naming for archive datasets.

use std::path::{Component, Path, PathBuf};

/// Extension given to downloaded datasets.
pub const DATASET_EXTENSION: &str = ".fits";

/// Suffix of in-progress downloads.
const PARTIAL_SUFFIX: &str = ".part";

/// Local filename for a dataset id (`ADP.2014-09-16T11:03:30.727` →
/// `ADP.2014-09-16T11_03_30.727.fits`).
#[must_use]
pub fn dataset_filename(dataset_id: &str) -> String {
    let base = sanitize_filename(dataset_id.trim());
    if base.to_ascii_lowercase().ends_with(DATASET_EXTENSION) {
        base
    } else {
        format!("{base}{DATASET_EXTENSION}")
    }
}

/// Path used while a download is still streaming.
#[must_use]
pub(crate) fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    final_path.with_file_name(name)
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
