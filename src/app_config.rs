//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use starsearch_core::archive::mjd::parse_date;
use starsearch_core::archive::normalize_instrument;

/// TOML-backed file configuration for starsearch defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    /// ESO user to log in as.
    pub user: Option<String>,
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// TAP service root.
    pub tap_url: Option<String>,
    /// Data portal file endpoint.
    pub data_url: Option<String>,
    /// Single sign-on token endpoint.
    pub token_url: Option<String>,
    /// Default minimum SNR.
    pub min_snr: Option<f64>,
    /// Default earliest observation date.
    pub since: Option<NaiveDate>,
    /// Default instrument set.
    pub instruments: Option<Vec<String>>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// `MAXREC` sent with archive queries.
    pub max_rows: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(min_snr) = self.min_snr
            && (!min_snr.is_finite() || min_snr < 0.0)
        {
            bail!("Invalid config value for `min_snr`: {min_snr}. Expected a non-negative number");
        }
        if let Some(instruments) = &self.instruments
            && instruments.is_empty()
        {
            bail!("Invalid config value for `instruments`: expected at least one instrument");
        }
        if let Some(max_rows) = self.max_rows
            && max_rows == 0
        {
            bail!("Invalid config value for `max_rows`: 0. Expected at least 1");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        for (field, value) in [
            ("tap_url", &self.tap_url),
            ("data_url", &self.data_url),
            ("token_url", &self.token_url),
        ] {
            validate_url(field, value.as_deref())?;
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

fn validate_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let url = url::Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/starsearch/config.toml`
/// 2. `$HOME/.config/starsearch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("starsearch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("starsearch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "user" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `user` value on line {line_no}"))?;
                cfg.user = Some(parsed).filter(|u| !u.trim().is_empty());
            }
            "output_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `output_dir` value on line {line_no}"))?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "tap_url" | "data_url" | "token_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                let slot = match key {
                    "tap_url" => &mut cfg.tap_url,
                    "data_url" => &mut cfg.data_url,
                    _ => &mut cfg.token_url,
                };
                *slot = Some(parsed);
            }
            "min_snr" => {
                let parsed = parse_number(value)
                    .with_context(|| format!("Invalid `min_snr` value on line {line_no}"))?;
                cfg.min_snr = Some(parsed);
            }
            "since" => {
                let parsed = parse_string_literal(value)
                    .and_then(|s| parse_date(&s).map_err(anyhow::Error::from))
                    .with_context(|| format!("Invalid `since` value on line {line_no}"))?;
                cfg.since = Some(parsed);
            }
            "instruments" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `instruments` value on line {line_no}"))?;
                cfg.instruments = Some(
                    parsed
                        .split(',')
                        .map(normalize_instrument)
                        .filter(|i| !i.is_empty())
                        .collect(),
                );
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "max_rows" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `max_rows` value on line {line_no}"))?;
                cfg.max_rows = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_number(raw_value: &str) -> Result<f64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected numeric value");
    }
    Ok(token.parse::<f64>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
user = "astro"
min_snr = 50
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.user.as_deref(), Some("astro"));
        assert_eq!(cfg.min_snr, Some(50.0));
        assert!(cfg.output_dir.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
user = "astro"
output_dir = "/data/spectra"
tap_url = "https://archive.eso.org/tap_obs"
data_url = "https://dataportal.eso.org/dataportal_new/file"
token_url = "https://www.eso.org/sso/oidc/token"
min_snr = 12.5
since = "2004-01-01"
instruments = "harps, espresso"
connect_timeout_secs = 10
read_timeout_secs = 300
max_rows = 5000
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/data/spectra")));
        assert_eq!(cfg.min_snr, Some(12.5));
        assert_eq!(cfg.since, NaiveDate::from_ymd_opt(2004, 1, 1));
        assert_eq!(
            cfg.instruments,
            Some(vec!["HARPS".to_string(), "ESPRESSO".to_string()])
        );
        assert_eq!(cfg.connect_timeout_secs, Some(10));
        assert_eq!(cfg.read_timeout_secs, Some(300));
        assert_eq!(cfg.max_rows, Some(5000));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
# defaults for the workstation
min_snr = 40 # quality cut
output_dir = "/data/#spectra" # hash inside a string stays
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.min_snr, Some(40.0));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/data/#spectra")));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("user astro").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("user = astro").expect_err("quoted string expected");
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn test_parse_config_rejects_negative_snr() {
        let err = parse_config_str("min_snr = -3").expect_err("negative snr expected");
        assert!(err.to_string().contains("min_snr"));
    }

    #[test]
    fn test_parse_config_rejects_bad_date() {
        let err = parse_config_str(r#"since = "23/01/1990""#).expect_err("bad date expected");
        assert!(err.to_string().contains("since"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err =
            parse_config_str("connect_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("max_rows = 10 rows").expect_err("trailing token error");
        assert!(err.to_string().contains("max_rows"));
    }

    #[test]
    fn test_parse_config_rejects_zero_max_rows() {
        let err = parse_config_str("max_rows = 0").expect_err("zero max_rows expected");
        assert!(err.to_string().contains("max_rows"));
    }

    #[test]
    fn test_parse_config_rejects_empty_instrument_list() {
        let err = parse_config_str(r#"instruments = " , ""#).expect_err("empty list expected");
        assert!(err.to_string().contains("instruments"));
    }

    #[test]
    fn test_parse_config_rejects_non_http_url() {
        let err = parse_config_str(r#"tap_url = "ftp://archive.eso.org""#)
            .expect_err("non-http url expected");
        assert!(err.to_string().contains("tap_url"));
    }

    #[test]
    fn test_parse_config_blank_user_is_ignored() {
        let cfg = parse_config_str(r#"user = """#).expect("blank user should parse");
        assert!(cfg.user.is_none());
    }
}
