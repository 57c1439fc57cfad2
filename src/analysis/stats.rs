//! Statistic kinds, aggregation specs and descriptive statistics.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{format_number, SummaryTable, Table};
use std::fmt;
use std::str::FromStr;

/// A statistic computed over the numeric values of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Count,
    Sum,
    Min,
    Max,
    Mean,
    /// Sample standard deviation (n - 1 denominator).
    Std,
    /// Percentile in `0..=100`, linearly interpolated between ranks.
    Percentile(f64),
}

impl Statistic {
    /// Label used when a spec entry does not name one explicitly.
    pub fn default_label(&self) -> String {
        match self {
            Statistic::Count => "count".to_string(),
            Statistic::Sum => "sum".to_string(),
            Statistic::Min => "min".to_string(),
            Statistic::Max => "max".to_string(),
            Statistic::Mean => "mean".to_string(),
            Statistic::Std => "std".to_string(),
            Statistic::Percentile(p) => format!("p{}", format_number(*p)),
        }
    }

    /// Computes the statistic over values sorted in ascending order.
    ///
    /// Returns `None` when there is no data. `Count` is the one statistic
    /// that is defined on an empty group.
    pub fn compute_sorted(&self, sorted: &[f64]) -> Option<f64> {
        match self {
            Statistic::Count => Some(sorted.len() as f64),
            _ if sorted.is_empty() => None,
            Statistic::Sum => Some(sorted.iter().sum()),
            Statistic::Min => sorted.first().copied(),
            Statistic::Max => sorted.last().copied(),
            Statistic::Mean => Some(mean(sorted)),
            Statistic::Std => sample_std(sorted),
            Statistic::Percentile(p) => percentile(sorted, *p),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Percentile(p) => write!(f, "percentile({})", format_number(*p)),
            other => write!(f, "{}", other.default_label()),
        }
    }
}

impl FromStr for Statistic {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        let stat = match token.as_str() {
            "count" => Statistic::Count,
            "sum" => Statistic::Sum,
            "min" => Statistic::Min,
            "max" => Statistic::Max,
            "mean" | "avg" => Statistic::Mean,
            "std" => Statistic::Std,
            "median" => Statistic::Percentile(50.0),
            other => {
                let raw = other
                    .strip_prefix("percentile(")
                    .and_then(|r| r.strip_suffix(')'))
                    .or_else(|| other.strip_prefix('p'))
                    .ok_or_else(|| {
                        PipelineError::invalid_spec(format!("unknown statistic '{}'", s.trim()))
                    })?;
                let p: f64 = raw.trim().parse().map_err(|_| {
                    PipelineError::invalid_spec(format!("invalid percentile '{}'", s.trim()))
                })?;
                Statistic::Percentile(p)
            }
        };
        Ok(stat)
    }
}

/// One named statistic in an aggregation spec.
#[derive(Debug, Clone, PartialEq)]
pub struct StatEntry {
    /// Display label of the resulting column.
    pub label: String,
    pub stat: Statistic,
}

impl StatEntry {
    pub fn new(label: impl Into<String>, stat: Statistic) -> Self {
        Self {
            label: label.into(),
            stat,
        }
    }

    /// Entry labelled with the statistic's default label.
    pub fn of(stat: Statistic) -> Self {
        Self::new(stat.default_label(), stat)
    }
}

impl FromStr for StatEntry {
    type Err = PipelineError;

    /// Parses `stat` or `label=stat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((label, stat)) => Ok(Self::new(label.trim(), stat.parse()?)),
            None if s.trim().eq_ignore_ascii_case("median") => {
                Ok(Self::new("median", Statistic::Percentile(50.0)))
            }
            None => Ok(Self::of(s.parse()?)),
        }
    }
}

/// Ordered, validated list of statistics to compute per group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSpec {
    entries: Vec<StatEntry>,
}

impl AggregationSpec {
    /// Validates and builds a spec.
    ///
    /// Labels must be non-empty and unique, percentiles must lie in
    /// `0..=100`, and no percentile value may appear twice.
    pub fn new(entries: Vec<StatEntry>) -> PipelineResult<Self> {
        let mut labels: Vec<&str> = Vec::with_capacity(entries.len());
        let mut percentiles: Vec<f64> = Vec::new();

        for entry in &entries {
            if entry.label.trim().is_empty() {
                return Err(PipelineError::invalid_spec(format!(
                    "empty label for {}",
                    entry.stat
                )));
            }
            if labels.contains(&entry.label.as_str()) {
                return Err(PipelineError::invalid_spec(format!(
                    "duplicate label '{}'",
                    entry.label
                )));
            }
            labels.push(&entry.label);

            if let Statistic::Percentile(p) = entry.stat {
                if !(0.0..=100.0).contains(&p) {
                    return Err(PipelineError::invalid_spec(format!(
                        "percentile {} out of range 0..=100",
                        format_number(p)
                    )));
                }
                if percentiles.contains(&p) {
                    return Err(PipelineError::invalid_spec(format!(
                        "percentile {} requested twice",
                        format_number(p)
                    )));
                }
                percentiles.push(p);
            }
        }

        Ok(Self { entries })
    }

    /// Parses a comma-separated list such as `min,mean,top_70=p70,max`.
    pub fn parse(list: &str) -> PipelineResult<Self> {
        let entries = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<PipelineResult<Vec<StatEntry>>>()?;
        Self::new(entries)
    }

    #[allow(dead_code)] // Inspection helper
    pub fn entries(&self) -> &[StatEntry] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes every entry over an unsorted group of values.
    pub fn evaluate(&self, mut values: Vec<f64>) -> Vec<Option<f64>> {
        values.sort_by(f64::total_cmp);
        self.entries
            .iter()
            .map(|e| e.stat.compute_sorted(&values))
            .collect()
    }
}

/// Percentile of sorted values with linear interpolation between the two
/// nearest ranks. `p` is in `0..=100`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        Some(sorted[lower])
    } else {
        let frac = rank - lower as f64;
        Some(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Statistics reported by [`describe`], in output order.
pub fn describe_spec() -> AggregationSpec {
    AggregationSpec {
        entries: vec![
            StatEntry::new("count", Statistic::Count),
            StatEntry::new("mean", Statistic::Mean),
            StatEntry::new("std", Statistic::Std),
            StatEntry::new("min", Statistic::Min),
            StatEntry::new("25%", Statistic::Percentile(25.0)),
            StatEntry::new("50%", Statistic::Percentile(50.0)),
            StatEntry::new("75%", Statistic::Percentile(75.0)),
            StatEntry::new("max", Statistic::Max),
        ],
    }
}

/// Descriptive statistics for every column holding at least one number.
///
/// Rows are keyed by column label, in column order.
pub fn describe(table: &Table) -> SummaryTable {
    let spec = describe_spec();
    let mut summary = SummaryTable::new("column", spec.labels());

    for (idx, column) in table.columns().iter().enumerate() {
        let values: Vec<f64> = table.rows().iter().filter_map(|r| r[idx].as_f64()).collect();
        if values.is_empty() {
            continue;
        }
        summary.push(column.clone(), spec.evaluate(values));
    }

    summary
}
