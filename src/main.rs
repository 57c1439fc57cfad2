//! schoolstat - school open-data reports with grouped percentiles
//!
//! A CLI tool that fetches school disclosure tables from the open-data
//! API, translates their field codes into readable labels, and exports
//! the rows or a grouped statistical summary of them. Admissions
//! spreadsheets are summarized into per-unit grade cuts the same way.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, network, unknown column, etc.)
//!   2 - The request succeeded but returned no data

mod analysis;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod report;
mod schema;
mod upload;

use analysis::{AggregationSpec, FilterPredicate};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::PipelineError;
use fetch::{FetchOutcome, SchoolInfoClient};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Report, ReportBody, ReportMetadata, Table};
use schema::{catalog, EndpointId, SchemaMap};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    if args.list_endpoints {
        print_endpoints();
        return Ok(());
    }

    // Initialize logging
    init_logging(&args);

    info!("schoolstat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .schoolstat.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set your API key, default statistics, and output format.");
    Ok(())
}

/// Handle --list-endpoints: print the endpoint catalogue.
fn print_endpoints() {
    println!("Available endpoints:\n");
    for endpoint in catalog::ENDPOINTS {
        println!(
            "  {:>3}  {} ({} fields)",
            endpoint.code,
            endpoint.name,
            catalog::SHARED_FIELDS.len() + endpoint.fields.len()
        );
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Rows loaded from one source, with report context.
struct Loaded {
    title: String,
    table: Table,
    filters: Vec<FilterPredicate>,
    default_file_stem: String,
    metadata: ReportMetadata,
}

/// Run the complete workflow. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let format = config.general.format;
    let to_stdout = args.writes_to_stdout();
    let chatty = !args.quiet && !to_stdout;

    let loaded = match args.endpoint {
        Some(ref code) => match load_endpoint(&args, &config, code, chatty).await? {
            Some(loaded) => loaded,
            None => return Ok(2),
        },
        None => load_upload(&args, chatty)?,
    };

    if args.list_columns {
        return Ok(0);
    }

    let rows_loaded = loaded.table.row_count();
    let body = build_body(&args, &config, &loaded)?;

    let metadata = ReportMetadata {
        rows_loaded,
        filters: loaded.filters.iter().map(|f| f.to_string()).collect(),
        generated_at: Utc::now(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
        ..loaded.metadata
    };

    let report = Report {
        title: loaded.title,
        metadata,
        body,
    };

    // Write the report
    if to_stdout {
        print!("{}", report::render(&report, format)?);
        return Ok(0);
    }

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            loaded.default_file_stem,
            format.extension()
        ))
    });
    report::write_report(&report, format, &output)?;

    if chatty {
        print_summary(&report, format, &output);
    }

    Ok(0)
}

/// Fetch and normalize one endpoint. Returns `None` when there is no data.
async fn load_endpoint(
    args: &Args,
    config: &Config,
    code: &str,
    chatty: bool,
) -> Result<Option<Loaded>> {
    let schema = SchemaMap::from_catalog()?;
    let endpoint = EndpointId::new(code.trim());

    // Fail before the network round trip
    if !schema.has_endpoint(&endpoint) {
        return Err(PipelineError::UnknownEndpoint(endpoint.to_string()).into());
    }

    let client = SchoolInfoClient::new(config.api_config()?)?;

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!(
            "Fetching endpoint {} ({} schools, {})...",
            endpoint, args.level, args.year
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let outcome = client.fetch_rows(&endpoint, args.level, args.year).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let raw = match outcome? {
        FetchOutcome::Rows(table) => table,
        FetchOutcome::NoData => {
            eprintln!(
                "⚠️  No data for endpoint {} ({} schools, {}).",
                endpoint, args.level, args.year
            );
            return Ok(None);
        }
    };

    if args.list_columns {
        for (raw_code, label) in schema.describe_columns(&raw, &endpoint) {
            println!("{:<24} {}", raw_code, label.as_deref().unwrap_or("(unmapped)"));
        }
    }

    let table = schema.normalize(&raw, &endpoint)?;
    debug!("Normalized columns: {:?}", table.columns());

    let name = catalog::find_endpoint(endpoint.as_str())
        .map(|e| e.name)
        .unwrap_or("School Data");

    if chatty && !args.list_columns {
        println!(
            "📥 Loaded {} rows from endpoint {} ({})",
            table.row_count(),
            endpoint,
            name
        );
    }

    Ok(Some(Loaded {
        title: format!("{} ({} {})", name, args.level, args.year),
        table,
        filters: args.filters.clone(),
        default_file_stem: format!("school_data_{}_{}_{}", args.year, args.level, endpoint),
        metadata: ReportMetadata {
            source: config.api.base_url.clone(),
            endpoint: Some(endpoint.to_string()),
            school_level: Some(args.level.to_string()),
            year: Some(args.year),
            rows_loaded: 0,
            filters: Vec::new(),
            generated_at: Utc::now(),
            duration_seconds: 0.0,
        },
    }))
}

/// Read an admissions workbook and list its categories.
fn load_upload(args: &Args, chatty: bool) -> Result<Loaded> {
    let path = args
        .upload
        .as_ref()
        .context("No data source given")?;

    let table = upload::read_admissions_sheet(path)?;

    if chatty {
        println!(
            "📥 Loaded {} rows from {}",
            table.row_count(),
            path.display()
        );
        if let Some(categories) = table.distinct_values(upload::CATEGORY) {
            println!("   Categories: {}", categories.join(", "));
        }
    }

    let mut filters = Vec::new();
    if let Some(ref category) = args.category {
        filters.push(FilterPredicate::new(upload::CATEGORY, category.as_str()));
    }
    filters.extend(args.filters.iter().cloned());

    Ok(Loaded {
        title: "Grade Cuts".to_string(),
        table,
        filters,
        default_file_stem: "grade_cuts".to_string(),
        metadata: ReportMetadata {
            source: path.display().to_string(),
            endpoint: None,
            school_level: None,
            year: None,
            rows_loaded: 0,
            filters: Vec::new(),
            generated_at: Utc::now(),
            duration_seconds: 0.0,
        },
    })
}

/// Filter, then describe, aggregate, or pass the rows through.
fn build_body(args: &Args, config: &Config, loaded: &Loaded) -> Result<ReportBody> {
    if args.describe {
        let filtered = analysis::filter_rows(&loaded.table, &loaded.filters)?;
        info!("Describing {} rows", filtered.row_count());
        return Ok(ReportBody::Summary(analysis::describe(&filtered)));
    }

    // Uploads always aggregate; fetched tables only when asked to
    let grouping = if args.upload.is_some() {
        Some((
            args.group_by.as_deref().unwrap_or(upload::UNIT),
            args.value.as_deref().unwrap_or(upload::GRADE),
        ))
    } else {
        args.group_by.as_deref().zip(args.value.as_deref())
    };

    let Some((group_key, value_column)) = grouping else {
        let filtered = analysis::filter_rows(&loaded.table, &loaded.filters)?;
        info!("{} of {} rows kept", filtered.row_count(), loaded.table.row_count());
        return Ok(ReportBody::Table(filtered));
    };

    let spec = AggregationSpec::parse(&config.report.stats)?;
    if spec.is_empty() {
        warn!("No statistics requested; the summary will list group keys only");
    }
    info!(
        "Aggregating '{}' by '{}' with [{}]",
        value_column,
        group_key,
        spec.labels().join(", ")
    );

    let mut summary =
        analysis::aggregate(&loaded.table, &loaded.filters, group_key, value_column, &spec)?;
    if config.report.sort_groups {
        summary.sort_by_key();
    }

    if summary.rows.is_empty() {
        warn!("No rows matched the filters");
    }

    Ok(ReportBody::Summary(summary))
}

fn print_summary(report: &Report, format: OutputFormat, output: &std::path::Path) {
    println!("\n📊 Summary:");
    println!("   Rows loaded: {}", report.metadata.rows_loaded);
    match &report.body {
        ReportBody::Table(table) => println!("   Rows exported: {}", table.row_count()),
        ReportBody::Summary(summary) => println!(
            "   Groups: {} | Statistics: {}",
            summary.rows.len(),
            summary.stat_labels.join(", ")
        ),
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!(
        "\n✅ Report ({:?}) saved to: {}",
        format,
        output.display()
    );
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
