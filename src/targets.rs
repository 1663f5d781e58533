//! Target names and target list files.
//!
//! Target lists are tab-separated catalogues in the SWEET-Cat `.rdb` layout:
//! a header line, optionally a `----` separator line, then one star per row
//! with the name in the first column.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// ` b` … ` j` or ` B` planet designation after a star name.
#[allow(clippy::expect_used)]
static PLANET_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<star>.*\S)\s+[b-jB]$").expect("planet letter regex is valid") // Static pattern, safe to panic
});

/// `.01`, `.02` or `.2` candidate numbering (KOI/TOI style).
#[allow(clippy::expect_used)]
static PLANET_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<star>.+?)\.(?:01|02|2)$").expect("planet number regex is valid")
});

/// Errors reading a target list.
#[derive(Debug, Error)]
pub enum TargetListError {
    /// The file could not be read.
    #[error("failed to read target list {path}: {source}")]
    Io {
        /// The list file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file has no target rows.
    #[error("target list {path} contains no targets")]
    Empty {
        /// The list file.
        path: PathBuf,
    },
}

/// Strips a trailing planet designation from a name (`"HD 10180 c"` → `"HD 10180"`).
#[must_use]
pub fn strip_planet_suffix(name: &str) -> String {
    let name = name.trim();
    for pattern in [&*PLANET_LETTER, &*PLANET_NUMBER] {
        if let Some(star) = pattern.captures(name).and_then(|c| c.name("star")) {
            return star.as_str().to_string();
        }
    }
    name.to_string()
}

/// Parses target names out of list text.
///
/// The first line is a header. Blank lines and `-` separator lines are
/// skipped; duplicates are kept so the output lines up with the input.
#[must_use]
pub fn parse_target_list(text: &str) -> Vec<String> {
    text.lines()
        .skip(1)
        .filter(|line| !is_separator(line))
        .filter_map(|line| line.split('\t').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '-' || c == '\t' || c == ' ')
}

/// Reads a target list file.
///
/// # Errors
///
/// Returns [`TargetListError::Io`] if the file cannot be read and
/// [`TargetListError::Empty`] if it lists no targets.
pub fn read_target_list(path: &Path) -> Result<Vec<String>, TargetListError> {
    let text = std::fs::read_to_string(path).map_err(|source| TargetListError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let targets = parse_target_list(&text);
    if targets.is_empty() {
        return Err(TargetListError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(targets)
}
