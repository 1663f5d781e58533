//! Terminal detection and tracing setup.

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_use_progress_bar(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// Log level used when `RUST_LOG` is unset.
///
/// Priority: quiet flag > verbose flag > default (info).
pub(crate) fn resolve_default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_only_on_interactive_non_quiet_terminal() {
        assert!(should_use_progress_bar(true, false, false));
        assert!(!should_use_progress_bar(false, false, false));
        assert!(!should_use_progress_bar(true, true, false));
        assert!(!should_use_progress_bar(true, false, true));
    }

    #[test]
    fn test_log_level_priority() {
        assert_eq!(resolve_default_log_level(0, false), "info");
        assert_eq!(resolve_default_log_level(1, false), "debug");
        assert_eq!(resolve_default_log_level(3, false), "trace");
        assert_eq!(resolve_default_log_level(2, true), "error");
    }
}
