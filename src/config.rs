//! Exporter configuration.
//!
//! Everything has a working default, so most users never write a config
//! file. When one exists it only needs the keys it overrides:
//!
//! ```toml
//! [api]
//! base_url = "https://www.paprikaapp.com/api/v2"
//! user_agent = "paprika-export/0.99.0"
//!
//! [credentials]
//! service = "PaprikaApi"          # token store service name
//! account = "paprika-exporter"    # token store account name
//!
//! [markdown]
//! layout = "recipe"               # `layout` key written to every frontmatter
//! ```
//!
//! ## Location
//!
//! `--config <path>` wins. Otherwise `<config dir>/paprika-export/config.toml`
//! is used if it exists (`~/.config` on Linux, `~/Library/Application Support`
//! on macOS). With neither, stock defaults apply.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name under the platform config dir, shared with the token store.
pub const APP_DIR: &str = "paprika-export";

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Remote sync API settings.
    pub api: ApiConfig,
    /// Where the bearer token is cached between runs.
    pub credentials: CredentialsConfig,
    /// Markdown output settings.
    pub markdown: MarkdownConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            credentials: CredentialsConfig::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "api.base_url must be an http(s) URL".into(),
            ));
        }
        if self.credentials.service.trim().is_empty()
            || self.credentials.account.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "credentials.service and credentials.account must not be empty".into(),
            ));
        }
        if self.markdown.layout.trim().is_empty() {
            return Err(ConfigError::Validation(
                "markdown.layout must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base of the v2 API; endpoint paths are appended to it.
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.paprikaapp.com/api/v2".to_string(),
            user_agent: concat!("paprika-export/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub service: String,
    pub account: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            service: "PaprikaApi".to_string(),
            account: "paprika-exporter".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    pub layout: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            layout: "recipe".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ExportConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse config text, layer it over the stock defaults, and validate.
pub fn parse_config(content: &str) -> Result<ExportConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: ExportConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config from an explicit path, or from the default location.
///
/// An explicit path must exist. The default location is optional: when it
/// is absent (or there is no platform config dir) stock defaults are used.
pub fn load_config(explicit: Option<&Path>) -> Result<ExportConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ExportConfig::default()),
        },
    };
    let content = fs::read_to_string(&path)?;
    parse_config(&content)
}

/// `<config dir>/paprika-export/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = ExportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.api.base_url, "https://www.paprikaapp.com/api/v2");
        assert_eq!(config.credentials.service, "PaprikaApi");
        assert_eq!(config.credentials.account, "paprika-exporter");
        assert_eq!(config.markdown.layout, "recipe");
    }

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse_config("").unwrap(), ExportConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = parse_config(
            r#"
[api]
base_url = "http://localhost:8080/api/v2"
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v2");
        assert_eq!(config.api.user_agent, ApiConfig::default().user_agent);
        assert_eq!(config.markdown.layout, "recipe");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = parse_config(
            r#"
[markdown]
layuot = "post"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let result = parse_config("this is not valid toml [[[");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let result = parse_config(
            r#"
[api]
base_url = "ftp://example.com"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn blank_credentials_fail_validation() {
        let result = parse_config(
            r#"
[credentials]
account = " "
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn merge_toml_overlay_wins_and_base_survives() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn load_config_reads_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[markdown]\nlayout = \"post\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.markdown.layout, "post");
    }

    #[test]
    fn load_config_missing_explicit_path_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
