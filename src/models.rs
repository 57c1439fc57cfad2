//! Data models for schoolstat.
//!
//! This module contains the tabular structures shared by the schema
//! normalizer, the aggregation pipeline and the report generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single scalar value in a table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text, including numbers the upstream emits as strings.
    Text(String),
}

impl Cell {
    /// Returns true if the cell holds no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Reads the cell as a finite number.
    ///
    /// Text is trimmed and may carry thousands separators. Anything else
    /// that is not a finite number yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Equality test against a literal taken from a filter expression.
    pub fn matches(&self, literal: &str) -> bool {
        match self {
            Cell::Null => false,
            Cell::Bool(b) => literal.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
            Cell::Number(n) => literal
                .trim()
                .parse::<f64>()
                .map(|lit| lit == *n)
                .unwrap_or(false),
            Cell::Text(s) => s == literal,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(b) => Cell::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            serde_json::Value::String(s) => Cell::Text(s),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// An ordered set of rows sharing one column set.
///
/// Column order is the order in which keys were first seen. Every row has
/// exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from keyed records.
    ///
    /// Keys missing from a record are filled with [`Cell::Null`].
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Vec<(String, Cell)>>,
    {
        let records: Vec<Vec<(String, Cell)>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for record in &records {
            for (key, _) in record {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Cell::Null; columns.len()];
                for (key, cell) in record {
                    row[positions[&key]] = cell;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Appends a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by label.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Returns a copy of this table with new column labels.
    ///
    /// `columns` must have the same length as the current column set.
    pub fn with_columns(&self, columns: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            columns,
            rows: self.rows.clone(),
        }
    }

    /// Distinct non-null values of a column in first-seen order.
    pub fn distinct_values(&self, label: &str) -> Option<Vec<String>> {
        let idx = self.column_index(label)?;
        let mut seen = Vec::new();
        for row in &self.rows {
            if row[idx].is_null() {
                continue;
            }
            let value = row[idx].to_string();
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        Some(seen)
    }
}

/// One row of a [`SummaryTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Group key value.
    pub key: String,
    /// One value per statistic; `None` means no data.
    pub values: Vec<Option<f64>>,
}

/// Numeric results indexed by group key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Label of the group-key column.
    pub key_column: String,
    /// Statistic labels, in requested order.
    pub stat_labels: Vec<String>,
    /// Rows in group order.
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(key_column: impl Into<String>, stat_labels: Vec<String>) -> Self {
        Self {
            key_column: key_column.into(),
            stat_labels,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, values: Vec<Option<f64>>) {
        self.rows.push(SummaryRow {
            key: key.into(),
            values,
        });
    }

    /// All column headers: key column followed by statistic labels.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once(self.key_column.clone())
            .chain(self.stat_labels.iter().cloned())
            .collect()
    }

    pub fn row(&self, key: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Looks up one statistic of one group.
    ///
    /// Returns `None` if the group or label is unknown, `Some(None)` if the
    /// statistic had no data.
    #[allow(dead_code)] // Lookup helper for callers that hold a summary
    pub fn value(&self, key: &str, label: &str) -> Option<Option<f64>> {
        let col = self.stat_labels.iter().position(|l| l == label)?;
        self.row(key).map(|r| r.values[col])
    }

    /// Orders rows by key, numerically when every key is a number.
    pub fn sort_by_key(&mut self) {
        let all_numeric = self.rows.iter().all(|r| r.key.trim().parse::<f64>().is_ok());
        if all_numeric {
            self.rows.sort_by(|a, b| {
                let x: f64 = a.key.trim().parse().unwrap_or(0.0);
                let y: f64 = b.key.trim().parse().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal)
            });
        } else {
            self.rows.sort_by(|a, b| a.key.cmp(&b.key));
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Human-readable description of where the rows came from.
    pub source: String,
    /// Endpoint code, for API fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// School level code, for API fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_level: Option<String>,
    /// Disclosure year, for API fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// Number of rows loaded before filtering.
    pub rows_loaded: usize,
    /// Filters applied, rendered as `label == value`.
    pub filters: Vec<String>,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
}

/// Report payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportBody {
    /// Normalized rows, unaggregated.
    Table(Table),
    /// Grouped or descriptive statistics.
    Summary(SummaryTable),
}

/// A complete report ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report title.
    pub title: String,
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// Tabular content.
    pub body: ReportBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Cell)]) -> Vec<(String, Cell)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_cell_as_f64() {
        assert_eq!(Cell::Number(3.5).as_f64(), Some(3.5));
        assert_eq!(Cell::from(" 12 ").as_f64(), Some(12.0));
        assert_eq!(Cell::from("1,234").as_f64(), Some(1234.0));
        assert_eq!(Cell::from("n/a").as_f64(), None);
        assert_eq!(Cell::Null.as_f64(), None);
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);
        assert_eq!(Cell::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_cell_matches() {
        assert!(Cell::from("enrolled").matches("enrolled"));
        assert!(!Cell::from("enrolled").matches("Enrolled"));
        assert!(Cell::Number(3.0).matches("3"));
        assert!(Cell::Number(3.0).matches("3.0"));
        assert!(!Cell::Null.matches(""));
        assert!(Cell::Bool(false).matches("FALSE"));
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(Cell::from(serde_json::json!(null)), Cell::Null);
        assert_eq!(Cell::from(serde_json::json!(4)), Cell::Number(4.0));
        assert_eq!(Cell::from(serde_json::json!("x")), Cell::from("x"));
        assert_eq!(Cell::from(serde_json::json!([1])), Cell::from("[1]"));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(4.0).to_string(), "4");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Null.to_string(), "");
    }

    #[test]
    fn test_from_records_unions_columns_in_first_seen_order() {
        let table = Table::from_records(vec![
            record(&[("b", Cell::from("1")), ("a", Cell::from("2"))]),
            record(&[("a", Cell::from("3")), ("c", Cell::from("4"))]),
        ]);

        assert_eq!(table.columns(), &["b", "a", "c"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][2], Cell::Null);
        assert_eq!(table.rows()[1][0], Cell::Null);
        assert_eq!(table.rows()[1][2], Cell::from("4"));
    }

    #[test]
    fn test_push_row_pads() {
        let mut table = Table::new(vec!["x".to_string(), "y".to_string()]);
        table.push_row(vec![Cell::from("1")]);
        assert_eq!(table.rows()[0], vec![Cell::from("1"), Cell::Null]);
    }

    #[test]
    fn test_distinct_values_skip_null() {
        let table = Table::from_records(vec![
            record(&[("k", Cell::from("B"))]),
            record(&[("k", Cell::Null)]),
            record(&[("k", Cell::from("A"))]),
            record(&[("k", Cell::from("B"))]),
        ]);
        assert_eq!(
            table.distinct_values("k"),
            Some(vec!["B".to_string(), "A".to_string()])
        );
        assert_eq!(table.distinct_values("missing"), None);
    }

    #[test]
    fn test_summary_sort_by_key() {
        let mut summary = SummaryTable::new("unit", vec!["mean".to_string()]);
        summary.push("10", vec![Some(1.0)]);
        summary.push("9", vec![Some(2.0)]);
        summary.sort_by_key();
        assert_eq!(summary.rows[0].key, "9");

        let mut summary = SummaryTable::new("unit", vec!["mean".to_string()]);
        summary.push("b", vec![None]);
        summary.push("a", vec![Some(2.0)]);
        summary.sort_by_key();
        assert_eq!(summary.rows[0].key, "a");
        assert_eq!(summary.value("b", "mean"), Some(None));
        assert_eq!(summary.value("b", "max"), None);
    }
}
