//! Error taxonomy for the normalization and aggregation core.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Structural errors raised by schema normalization and aggregation.
///
/// Per-value numeric noise is never an error; it is excluded from the
/// statistic it would have contributed to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("unknown endpoint '{0}': no schema entries are registered for it")]
    UnknownEndpoint(String),
    #[error("column not found: '{0}'")]
    ColumnNotFound(String),
    #[error("invalid aggregation spec: {0}")]
    InvalidAggregationSpec(String),
    #[error("label collision on endpoint '{endpoint}': '{first}' and '{second}' both map to '{label}'")]
    LabelCollision {
        endpoint: String,
        label: String,
        first: String,
        second: String,
    },
}

impl PipelineError {
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound(column.into())
    }

    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidAggregationSpec(message.into())
    }
}
