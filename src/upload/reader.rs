//! Admissions spreadsheet reader.
//!
//! The sheet has a fixed layout: category name, organizational unit,
//! registration status and computed grade, in that order. Header text is
//! ignored and the columns are renamed by position.

use crate::models::{Cell, Table};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Admission category (전형명).
pub const CATEGORY: &str = "전형명";
/// Organizational unit (모집단위).
pub const UNIT: &str = "모집단위";
/// Registration status (등록여부).
pub const STATUS: &str = "등록여부";
/// Computed grade (산출등급).
pub const GRADE: &str = "산출등급";

/// Column labels assigned by position.
pub const UPLOAD_COLUMNS: [&str; 4] = [CATEGORY, UNIT, STATUS, GRADE];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to open workbook {path}: {message}")]
    Open { path: String, message: String },
    #[error("workbook has no worksheets")]
    NoSheet,
    #[error("sheet has {found} columns, expected at least 4")]
    MissingColumns { found: usize },
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

/// Builds the four-column table from raw sheet rows, header first.
pub fn table_from_rows<I>(rows: I) -> Result<Table, UploadError>
where
    I: IntoIterator<Item = Vec<Cell>>,
{
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    if header.len() < UPLOAD_COLUMNS.len() {
        return Err(UploadError::MissingColumns {
            found: header.len(),
        });
    }

    let mut table = Table::new(UPLOAD_COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in rows {
        if row.iter().all(Cell::is_null) {
            continue;
        }
        table.push_row(row.into_iter().take(UPLOAD_COLUMNS.len()).collect());
    }

    Ok(table)
}

/// Reads the first worksheet of an admissions workbook.
pub fn read_admissions_sheet(path: &Path) -> Result<Table, UploadError> {
    info!("Reading workbook: {}", path.display());

    let mut workbook = open_workbook_auto(path).map_err(|e| UploadError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(UploadError::NoSheet)?
        .map_err(|e| UploadError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let (height, width) = range.get_size();
    debug!("First sheet is {} rows x {} columns", height, width);

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>());
    let table = table_from_rows(rows)?;

    info!("Loaded {} admission records", table.row_count());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|c| if c.is_empty() { Cell::Null } else { Cell::from(*c) })
            .collect()
    }

    #[test]
    fn test_table_from_rows_renames_positionally() {
        let table = table_from_rows(vec![
            row(&["type", "dept", "registered", "grade", "note"]),
            row(&["학생부교과", "국어국문학과(101)", "등록", "2.3", "x"]),
            row(&["", "", "", "", ""]),
            row(&["논술", "수학과(201)", "미등록"]),
        ])
        .unwrap();

        assert_eq!(table.columns(), &UPLOAD_COLUMNS);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].len(), 4);
        assert_eq!(table.rows()[1][3], Cell::Null);
    }

    #[test]
    fn test_table_from_rows_missing_columns() {
        let err = table_from_rows(vec![row(&["a", "b", "c"])]).unwrap_err();
        assert!(matches!(err, UploadError::MissingColumns { found: 3 }));

        let err = table_from_rows(Vec::<Vec<Cell>>::new()).unwrap_err();
        assert!(matches!(err, UploadError::MissingColumns { found: 0 }));
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(cell_from_data(&Data::Float(2.5)), Cell::Number(2.5));
        assert_eq!(cell_from_data(&Data::String(" ".to_string())), Cell::Null);
        assert_eq!(cell_from_data(&Data::Empty), Cell::Null);
    }

    #[test]
    fn test_read_invalid_workbook() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();

        let err = read_admissions_sheet(&path).unwrap_err();
        assert!(matches!(err, UploadError::Open { .. }));
    }
}
