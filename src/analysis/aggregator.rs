//! Filter, group and aggregate.
//!
//! The pipeline is a pure transformation over a materialized table:
//! equality filters are applied as a conjunction, surviving rows are
//! partitioned by a categorical key, and every group is summarized with an
//! [`AggregationSpec`].

use crate::analysis::stats::AggregationSpec;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Cell, SummaryTable, Table};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Equality test of one column against a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterPredicate {
    pub column: String,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    fn matches(&self, cell: &Cell) -> bool {
        cell.matches(&self.value)
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.column, self.value)
    }
}

impl FromStr for FilterPredicate {
    type Err = String;

    /// Parses `column=value`. The value may be empty but the column may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, value) = s
            .split_once('=')
            .ok_or_else(|| format!("filter '{}' must have the form COLUMN=VALUE", s))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(format!("filter '{}' has an empty column name", s));
        }
        Ok(Self::new(column, value.trim()))
    }
}

fn require_column(table: &Table, label: &str) -> PipelineResult<usize> {
    table
        .column_index(label)
        .ok_or_else(|| PipelineError::column_not_found(label))
}

/// Returns a new table holding only the rows that satisfy every filter.
///
/// Every filter column must exist, even when the table has no rows.
pub fn filter_rows(table: &Table, filters: &[FilterPredicate]) -> PipelineResult<Table> {
    let resolved = filters
        .iter()
        .map(|f| require_column(table, &f.column).map(|idx| (idx, f)))
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut filtered = Table::new(table.columns().to_vec());
    for row in table.rows() {
        if resolved.iter().all(|(idx, f)| f.matches(&row[*idx])) {
            filtered.push_row(row.clone());
        }
    }

    Ok(filtered)
}

/// Filters, groups by `group_key` and summarizes `value_column` per group.
///
/// Groups appear in first-seen order. Rows with a null key are skipped.
/// Keys are compared by their displayed text, so `1` read as a number and
/// `"1"` read as text land in the same group.
/// Values that do not read as numbers are excluded from their group's
/// statistics; a group left without numbers yields `None` for every
/// statistic except `count`.
pub fn aggregate(
    table: &Table,
    filters: &[FilterPredicate],
    group_key: &str,
    value_column: &str,
    spec: &AggregationSpec,
) -> PipelineResult<SummaryTable> {
    let key_idx = require_column(table, group_key)?;
    let value_idx = require_column(table, value_column)?;
    let filtered = filter_rows(table, filters)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();

    for row in filtered.rows() {
        let key_cell = &row[key_idx];
        if key_cell.is_null() {
            continue;
        }
        let key = key_cell.to_string();
        let values = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if let Some(v) = row[value_idx].as_f64() {
            values.push(v);
        }
    }

    let mut summary = SummaryTable::new(group_key, spec.labels());
    for key in order {
        let values = groups.remove(&key).unwrap_or_default();
        let stats = spec.evaluate(values);
        summary.push(key, stats);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stats::{StatEntry, Statistic};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn admissions() -> Table {
        let rows = [
            ("A", "enrolled", "3"),
            ("A", "enrolled", "5"),
            ("B", "enrolled", "1"),
            ("B", "withdrawn", "9"),
        ];
        Table::from_records(rows.iter().map(|(unit, status, grade)| {
            vec![
                ("unit".to_string(), Cell::from(*unit)),
                ("status".to_string(), Cell::from(*status)),
                ("grade".to_string(), Cell::from(*grade)),
            ]
        }))
    }

    fn standard_spec() -> AggregationSpec {
        AggregationSpec::new(vec![
            StatEntry::of(Statistic::Min),
            StatEntry::of(Statistic::Mean),
            StatEntry::of(Statistic::Percentile(50.0)),
            StatEntry::of(Statistic::Max),
        ])
        .unwrap()
    }

    #[test]
    fn test_end_to_end_grouped_summary() {
        let summary = aggregate(
            &admissions(),
            &[FilterPredicate::new("status", "enrolled")],
            "unit",
            "grade",
            &standard_spec(),
        )
        .unwrap();

        assert_eq!(summary.headers(), vec!["unit", "min", "mean", "p50", "max"]);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].key, "A");
        assert_eq!(
            summary.rows[0].values,
            vec![Some(3.0), Some(4.0), Some(4.0), Some(5.0)]
        );
        assert_eq!(summary.rows[1].key, "B");
        assert_eq!(
            summary.rows[1].values,
            vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)]
        );
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let table = Table::from_records(["z", "a", "z", "m"].iter().map(|k| {
            vec![
                ("k".to_string(), Cell::from(*k)),
                ("v".to_string(), Cell::Number(1.0)),
            ]
        }));
        let summary = aggregate(&table, &[], "k", "v", &standard_spec()).unwrap();
        let keys: Vec<_> = summary.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_non_numeric_values_excluded() {
        let table = Table::from_records(
            [("A", Cell::from("2")), ("A", Cell::from("-")), ("B", Cell::Null)]
                .into_iter()
                .map(|(k, v)| vec![("k".to_string(), Cell::from(k)), ("v".to_string(), v)]),
        );
        let spec = AggregationSpec::parse("count,mean").unwrap();

        let summary = aggregate(&table, &[], "k", "v", &spec).unwrap();

        assert_eq!(summary.value("A", "count"), Some(Some(1.0)));
        assert_eq!(summary.value("A", "mean"), Some(Some(2.0)));
        assert_eq!(summary.value("B", "count"), Some(Some(0.0)));
        assert_eq!(summary.value("B", "mean"), Some(None));
    }

    #[test]
    fn test_keys_grouped_by_displayed_text() {
        let table = Table::from_records(vec![
            vec![("k".to_string(), Cell::Number(1.0)), ("v".to_string(), Cell::Number(1.0))],
            vec![("k".to_string(), Cell::from("1")), ("v".to_string(), Cell::Number(3.0))],
            vec![("k".to_string(), Cell::Bool(true)), ("v".to_string(), Cell::Number(5.0))],
            vec![("k".to_string(), Cell::from("true")), ("v".to_string(), Cell::Number(7.0))],
        ]);
        let spec = AggregationSpec::parse("count,mean").unwrap();

        let summary = aggregate(&table, &[], "k", "v", &spec).unwrap();

        let keys: Vec<_> = summary.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "true"]);
        assert_eq!(summary.value("1", "count"), Some(Some(2.0)));
        assert_eq!(summary.value("1", "mean"), Some(Some(2.0)));
        assert_eq!(summary.value("true", "mean"), Some(Some(6.0)));
    }

    #[test]
    fn test_null_group_key_skipped() {
        let table = Table::from_records(vec![
            vec![("k".to_string(), Cell::Null), ("v".to_string(), Cell::Number(1.0))],
            vec![("k".to_string(), Cell::from("A")), ("v".to_string(), Cell::Number(2.0))],
        ]);
        let summary = aggregate(&table, &[], "k", "v", &standard_spec()).unwrap();
        assert_eq!(summary.rows.len(), 1);
    }

    #[test]
    fn test_missing_group_column() {
        let err = aggregate(&admissions(), &[], "nonexistent", "grade", &standard_spec())
            .unwrap_err();
        assert_eq!(err, PipelineError::ColumnNotFound("nonexistent".to_string()));
    }

    #[test]
    fn test_missing_value_column() {
        let err = aggregate(&admissions(), &[], "unit", "score", &standard_spec()).unwrap_err();
        assert_eq!(err, PipelineError::ColumnNotFound("score".to_string()));
    }

    #[test]
    fn test_missing_filter_column() {
        let err = aggregate(
            &admissions(),
            &[FilterPredicate::new("year", "2024")],
            "unit",
            "grade",
            &standard_spec(),
        )
        .unwrap_err();
        assert_eq!(err, PipelineError::ColumnNotFound("year".to_string()));
    }

    #[test]
    fn test_empty_spec_yields_key_column_only() {
        let summary = aggregate(
            &admissions(),
            &[],
            "unit",
            "grade",
            &AggregationSpec::default(),
        )
        .unwrap();
        assert_eq!(summary.headers(), vec!["unit"]);
        assert_eq!(summary.rows.len(), 2);
        assert!(summary.rows.iter().all(|r| r.values.is_empty()));
    }

    #[test]
    fn test_filter_rows_leaves_source_untouched() {
        let table = admissions();
        let filtered = filter_rows(&table, &[FilterPredicate::new("status", "withdrawn")]).unwrap();
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn test_parse_filter() {
        let f: FilterPredicate = "등록여부=등록".parse().unwrap();
        assert_eq!(f, FilterPredicate::new("등록여부", "등록"));
        assert_eq!(f.to_string(), "등록여부 == 등록");
        assert!("novalue".parse::<FilterPredicate>().is_err());
        assert!("=x".parse::<FilterPredicate>().is_err());
    }

    fn arb_table() -> impl Strategy<Value = Table> {
        proptest::collection::vec(
            (
                proptest::sample::select(vec!["A", "B", "C"]),
                proptest::sample::select(vec!["x", "y"]),
                proptest::sample::select(vec!["p", "q"]),
                0u32..100,
            ),
            0..40,
        )
        .prop_map(|rows| {
            Table::from_records(rows.into_iter().map(|(g, a, b, v)| {
                vec![
                    ("g".to_string(), Cell::from(g)),
                    ("a".to_string(), Cell::from(a)),
                    ("b".to_string(), Cell::from(b)),
                    ("v".to_string(), Cell::Number(v as f64)),
                ]
            }))
        })
    }

    proptest! {
        #[test]
        fn prop_filter_order_independent(table in arb_table()) {
            prop_assume!(table.row_count() > 0);
            let fa = FilterPredicate::new("a", "x");
            let fb = FilterPredicate::new("b", "p");
            let spec = standard_spec();

            let ab = aggregate(&table, &[fa.clone(), fb.clone()], "g", "v", &spec).unwrap();
            let ba = aggregate(&table, &[fb, fa], "g", "v", &spec).unwrap();

            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn prop_grouping_complete(table in arb_table()) {
            prop_assume!(table.row_count() > 0);
            let filters = [FilterPredicate::new("a", "y")];
            let summary = aggregate(&table, &filters, "g", "v", &standard_spec()).unwrap();
            let filtered = filter_rows(&table, &filters).unwrap();

            let keys: BTreeSet<String> = summary.rows.iter().map(|r| r.key.clone()).collect();
            let expected: BTreeSet<String> =
                filtered.distinct_values("g").unwrap().into_iter().collect();
            prop_assert_eq!(keys, expected);
        }
    }
}
