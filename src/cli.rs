//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::FilterPredicate;
use crate::schema::SchoolLevel;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// schoolstat - school open-data reports with grouped percentiles
///
/// Fetch a school disclosure table, translate its field codes into readable
/// labels, and export it or a grouped statistical summary of it. Admissions
/// spreadsheets can be summarized into grade cuts the same way.
///
/// Examples:
///   schoolstat --endpoint 22 --level high --year 2024
///   schoolstat --endpoint 09 --level middle --group-by 교육지원청 --value "전체 학생수" --stats min,mean,p50,max
///   schoolstat --endpoint 63 --describe --format csv
///   schoolstat --upload admissions.xlsx --category 학생부교과 --filter 등록여부=등록
///   schoolstat --list-endpoints
///   schoolstat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Endpoint code to fetch (see --list-endpoints)
    #[arg(short, long, value_name = "CODE", conflicts_with = "upload")]
    pub endpoint: Option<String>,

    /// School level to request
    #[arg(short, long, default_value = "elementary", value_name = "LEVEL")]
    pub level: SchoolLevel,

    /// Disclosure year to request
    #[arg(short, long, default_value = "2024", value_name = "YEAR")]
    pub year: u16,

    /// Admissions workbook (.xlsx) to summarize instead of fetching
    ///
    /// The first four columns are read as category, unit, registration
    /// status and computed grade, whatever their headers say.
    #[arg(short, long, value_name = "FILE")]
    pub upload: Option<PathBuf>,

    /// Admission category to keep (upload only)
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,

    /// Keep only rows where COLUMN equals VALUE (repeatable, all must match)
    ///
    /// Columns are named by their normalized labels.
    /// Example: --filter 등록여부=등록 --filter 설립구분=1
    #[arg(short, long = "filter", value_name = "COLUMN=VALUE")]
    pub filters: Vec<FilterPredicate>,

    /// Column whose values define the groups
    #[arg(short, long, value_name = "COLUMN")]
    pub group_by: Option<String>,

    /// Numeric column to summarize per group
    #[arg(long, value_name = "COLUMN")]
    pub value: Option<String>,

    /// Statistics to compute per group (comma-separated)
    ///
    /// Accepts count, sum, min, max, mean, std, median, pN or percentile(N),
    /// each optionally prefixed with LABEL=. Example: min,mean,top_70=p70,max
    #[arg(short, long, value_name = "LIST")]
    pub stats: Option<String>,

    /// Report descriptive statistics for every numeric column
    #[arg(long, conflicts_with = "group_by")]
    pub describe: bool,

    /// Order summary rows by group key instead of first appearance
    #[arg(long)]
    pub sort_groups: bool,

    /// Output format (markdown, json, csv, xlsx)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path, or - for standard output
    ///
    /// Defaults to a name derived from the request.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// API key for the open-data service
    #[arg(long, env = "SCHOOLSTAT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the open-data service
    #[arg(long, env = "SCHOOLSTAT_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .schoolstat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the endpoint catalogue and exit
    #[arg(long)]
    pub list_endpoints: bool,

    /// Fetch one page and print each raw field code with its label
    #[arg(long, requires = "endpoint")]
    pub list_columns: bool,

    /// Generate a default .schoolstat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// JSON document
    Json,
    /// Comma-separated values
    Csv,
    /// Excel workbook with a single sheet
    Xlsx,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Listing and config generation need no data source
        if self.init_config || self.list_endpoints {
            return Ok(());
        }

        match (&self.endpoint, &self.upload) {
            (None, None) => {
                return Err("Specify a data source with --endpoint or --upload".to_string())
            }
            (Some(_), Some(_)) => {
                return Err("Cannot use both --endpoint and --upload".to_string())
            }
            _ => {}
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if !(2000..=2100).contains(&self.year) {
            return Err(format!("Year must be between 2000 and 2100, got {}", self.year));
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.category.is_some() && self.upload.is_none() {
            return Err("--category only applies to --upload".to_string());
        }

        // Fetched tables have no natural grouping, so both columns are required
        if self.endpoint.is_some() && self.group_by.is_some() != self.value.is_some() {
            return Err("--group-by and --value must be given together".to_string());
        }

        if self.format == Some(OutputFormat::Xlsx) && self.writes_to_stdout() {
            return Err("Workbooks cannot be written to standard output; use --output FILE".to_string());
        }

        if self.describe && self.value.is_some() {
            return Err("Cannot use --describe with --value".to_string());
        }

        // Validate upload file if provided
        if let Some(ref path) = self.upload {
            if !path.exists() {
                return Err(format!("Upload file does not exist: {}", path.display()));
            }
            if !path.is_file() {
                return Err(format!("Upload path is not a file: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// True if output goes to standard output rather than a file.
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_deref().map(|p| p.as_os_str() == "-").unwrap_or(false)
    }
}
