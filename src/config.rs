//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.schoolstat.toml` files.

use crate::cli::OutputFormat;
use crate::fetch::ApiConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".schoolstat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Open-data API settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Open-data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Service endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key issued by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_seconds: default_timeout(),
            accept_invalid_certs: false,
        }
    }
}

fn default_base_url() -> String {
    "https://www.schoolinfo.go.kr/openApi.do".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Statistics computed per group when --stats is not given.
    #[serde(default = "default_stats")]
    pub stats: String,

    /// Order summary rows by group key.
    #[serde(default)]
    pub sort_groups: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            stats: default_stats(),
            sort_groups: false,
        }
    }
}

fn default_stats() -> String {
    "max,mean,p70,p80,p90,min".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load the configuration file from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref key) = args.api_key {
            self.api.api_key = Some(key.clone());
        }
        if let Some(ref url) = args.base_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(ref stats) = args.stats {
            self.report.stats = stats.clone();
        }
        if args.sort_groups {
            self.report.sort_groups = true;
        }
    }

    /// Connection settings for the fetch client.
    pub fn api_config(&self) -> Result<ApiConfig> {
        let api_key = self
            .api
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context(
                "No API key configured. Use --api-key, SCHOOLSTAT_API_KEY, or api.api_key in .schoolstat.toml",
            )?;

        Ok(ApiConfig {
            base_url: self.api.base_url.clone(),
            api_key,
            timeout_seconds: self.api.timeout_seconds,
            accept_invalid_certs: self.api.accept_invalid_certs,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.format, OutputFormat::Markdown);
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.api.api_key.is_none());
        assert_eq!(config.report.stats, "max,mean,p70,p80,p90,min");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "csv"

[api]
base_url = "https://example.org/openApi.do"
api_key = "abc"
accept_invalid_certs = true

[report]
stats = "min,max"
sort_groups = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, OutputFormat::Csv);
        assert_eq!(config.api.base_url, "https://example.org/openApi.do");
        assert_eq!(config.api.api_key.as_deref(), Some("abc"));
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.api.accept_invalid_certs);
        assert_eq!(config.report.stats, "min,max");
        assert!(config.report.sort_groups);
    }

    #[test]
    fn test_merge_with_args_cli_wins() {
        let mut config = Config::default();
        config.api.api_key = Some("from-file".to_string());
        config.report.stats = "min".to_string();

        let args = crate::cli::Args::try_parse_from([
            "schoolstat",
            "--endpoint",
            "22",
            "--api-key",
            "from-cli",
            "--timeout",
            "5",
            "--format",
            "json",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.api.api_key.as_deref(), Some("from-cli"));
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.general.format, OutputFormat::Json);
        // not given on the command line
        assert_eq!(config.report.stats, "min");
    }

    #[test]
    fn test_api_config_requires_key() {
        let mut config = Config::default();
        assert!(config.api_config().is_err());

        config.api.api_key = Some("  ".to_string());
        assert!(config.api_config().is_err());

        config.api.api_key = Some("abc".to_string());
        let api = config.api_config().unwrap();
        assert_eq!(api.api_key, "abc");
        assert_eq!(api.base_url, default_base_url());
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[report]\nstats = \"mean\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.report.stats, "mean");

        std::fs::write(temp_dir.path().join(CONFIG_FILE), "[report\n").unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.stats, Config::default().report.stats);
    }
}
