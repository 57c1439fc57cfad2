//! Report rendering.
//!
//! This module renders a [`Report`] as Markdown, JSON, CSV or an Excel
//! workbook. Column labels and row order are emitted exactly as the pipeline
//! produced them.

use crate::cli::OutputFormat;
use crate::models::{format_number, Cell, Report, ReportBody, ReportMetadata, SummaryTable, Table};
use anyhow::{bail, Context, Result};
use rust_xlsxwriter::{ColNum, RowNum, Workbook, Worksheet};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Byte-order mark so spreadsheet tools detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Placeholder for a statistic with no data.
const MISSING: &str = "-";

/// Worksheet name for fetched school data.
const SCHOOL_SHEET: &str = "학교정보";
/// Worksheet name for everything else.
const DEFAULT_SHEET: &str = "Sheet1";

/// Render a report in a text format.
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Csv => generate_csv_report(report),
        OutputFormat::Xlsx => bail!("xlsx is a binary format and must be written to a file"),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.title));
    output.push_str(&generate_metadata_section(&report.metadata));

    match &report.body {
        ReportBody::Table(table) => {
            output.push_str("## Data\n\n");
            output.push_str(&markdown_table_rows(table));
        }
        ReportBody::Summary(summary) => {
            output.push_str("## Summary\n\n");
            output.push_str(&markdown_summary_rows(summary));
        }
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    if let Some(ref endpoint) = metadata.endpoint {
        section.push_str(&format!("- **Endpoint:** `{}`\n", endpoint));
    }
    if let Some(ref level) = metadata.school_level {
        section.push_str(&format!("- **School Level:** {}\n", level));
    }
    if let Some(year) = metadata.year {
        section.push_str(&format!("- **Year:** {}\n", year));
    }
    section.push_str(&format!("- **Rows Loaded:** {}\n", metadata.rows_loaded));
    if !metadata.filters.is_empty() {
        section.push_str(&format!(
            "- **Filters:** {}\n",
            metadata
                .filters
                .iter()
                .map(|f| format!("`{}`", f))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn markdown_header(headers: &[String], numeric_from: usize) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(
        &headers
            .iter()
            .map(|h| escape_markdown(h))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    out.push_str(" |\n|");
    for i in 0..headers.len() {
        out.push_str(if i >= numeric_from { "---:|" } else { ":---|" });
    }
    out.push('\n');
    out
}

fn markdown_table_rows(table: &Table) -> String {
    if table.is_empty() || table.columns().is_empty() {
        return "No rows.\n\n".to_string();
    }

    let mut out = markdown_header(table.columns(), table.columns().len());
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(|c| escape_markdown(&c.to_string())).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out.push('\n');
    out
}

fn markdown_summary_rows(summary: &SummaryTable) -> String {
    if summary.rows.is_empty() {
        return "No groups matched the filters.\n\n".to_string();
    }

    let mut out = markdown_header(&summary.headers(), 1);
    for row in &summary.rows {
        let mut cells = vec![escape_markdown(&row.key)];
        cells.extend(row.values.iter().map(|v| format_stat(*v)));
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out.push('\n');
    out
}

/// Format a statistic with at most four decimals, trailing zeros trimmed.
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(v) => {
            let text = format!("{:.4}", v);
            let text = text.trim_end_matches('0').trim_end_matches('.');
            if text == "-0" {
                "0".to_string()
            } else {
                text.to_string()
            }
        }
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!("---\n\n*Report generated by schoolstat v{}*\n", env!("CARGO_PKG_VERSION"))
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a CSV export of the report body.
///
/// Metadata is not included; missing statistics are empty cells and the
/// others keep full precision.
pub fn generate_csv_report(report: &Report) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);

        match &report.body {
            ReportBody::Table(table) => {
                writer.write_record(table.columns())?;
                for row in table.rows() {
                    writer.write_record(row.iter().map(|c| c.to_string()))?;
                }
            }
            ReportBody::Summary(summary) => {
                writer.write_record(summary.headers())?;
                for row in &summary.rows {
                    let mut record = vec![row.key.clone()];
                    record.extend(
                        row.values
                            .iter()
                            .map(|v| v.map(format_number).unwrap_or_default()),
                    );
                    writer.write_record(&record)?;
                }
            }
        }

        writer.flush().context("Failed to flush CSV writer")?;
    }

    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}

fn sheet_position(row: usize, col: usize) -> Result<(RowNum, ColNum)> {
    let row = RowNum::try_from(row).context("Too many rows for a worksheet")?;
    let col = ColNum::try_from(col).context("Too many columns for a worksheet")?;
    Ok((row, col))
}

fn write_header(sheet: &mut Worksheet, headers: &[String]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        let (row, col) = sheet_position(0, col)?;
        sheet.write_string(row, col, header.as_str())?;
    }
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: usize, col: usize, cell: &Cell) -> Result<()> {
    let (row, col) = sheet_position(row, col)?;
    match cell {
        Cell::Null => {}
        Cell::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Cell::Number(n) if n.is_finite() => {
            sheet.write_number(row, col, *n)?;
        }
        Cell::Number(_) => {}
        Cell::Text(s) => {
            sheet.write_string(row, col, s.as_str())?;
        }
    }
    Ok(())
}

/// Generate an Excel workbook holding the report body on one sheet.
///
/// Row 1 holds the headers; data rows follow in produced order. Missing
/// values are left blank and numbers keep full precision.
pub fn generate_xlsx_report(report: &Report) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let sheet_name = if report.metadata.endpoint.is_some() {
        SCHOOL_SHEET
    } else {
        DEFAULT_SHEET
    };
    sheet.set_name(sheet_name)?;

    match &report.body {
        ReportBody::Table(table) => {
            write_header(sheet, table.columns())?;
            for (r, row) in table.rows().iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    write_cell(sheet, r + 1, c, cell)?;
                }
            }
        }
        ReportBody::Summary(summary) => {
            write_header(sheet, &summary.headers())?;
            for (r, row) in summary.rows.iter().enumerate() {
                write_cell(sheet, r + 1, 0, &Cell::Text(row.key.clone()))?;
                for (c, value) in row.values.iter().enumerate() {
                    if let Some(v) = value {
                        write_cell(sheet, r + 1, c + 1, &Cell::Number(*v))?;
                    }
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("Failed to build workbook")
}

/// Write the rendered report to a file.
///
/// CSV files start with a byte-order mark.
pub fn write_report(report: &Report, format: OutputFormat, path: &Path) -> Result<()> {
    let content: Vec<u8> = match format {
        OutputFormat::Xlsx => generate_xlsx_report(report)?,
        OutputFormat::Csv => {
            let mut bytes = UTF8_BOM.to_vec();
            bytes.extend_from_slice(render(report, format)?.as_bytes());
            bytes
        }
        _ => render(report, format)?.into_bytes(),
    };

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    file.write_all(&content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;

    info!("Report written to {}", path.display());
    Ok(())
}
