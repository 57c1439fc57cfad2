//! Schema-aware column normalization.
//!
//! Raw field codes are endpoint-scoped: the same code may mean different
//! things on different endpoints. The [`SchemaMap`] is therefore keyed by
//! `(endpoint, code)` and normalization always takes the endpoint.

pub mod catalog;

use crate::error::{PipelineError, PipelineResult};
use crate::models::Table;
use catalog::{EndpointSpec, ENDPOINTS, SHARED_FIELDS};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifier of an upstream endpoint (the `apiType` code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// School level filter understood by the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SchoolLevel {
    Elementary,
    Middle,
    High,
}

impl SchoolLevel {
    /// Upstream `schulKndCode` value.
    pub fn code(&self) -> &'static str {
        match self {
            SchoolLevel::Elementary => "02",
            SchoolLevel::Middle => "03",
            SchoolLevel::High => "04",
        }
    }
}

impl fmt::Display for SchoolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchoolLevel::Elementary => write!(f, "elementary"),
            SchoolLevel::Middle => write!(f, "middle"),
            SchoolLevel::High => write!(f, "high"),
        }
    }
}

/// Immutable mapping from `(endpoint, field code)` to canonical label.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    entries: HashMap<(EndpointId, String), String>,
    endpoints: HashSet<EndpointId>,
}

impl SchemaMap {
    /// Builds the map for every catalogued endpoint.
    pub fn from_catalog() -> PipelineResult<Self> {
        Self::from_specs(SHARED_FIELDS, ENDPOINTS)
    }

    /// Builds a map from a shared dictionary and per-endpoint dictionaries.
    ///
    /// Shared fields are registered on every endpoint first; an endpoint's
    /// own entry for the same code replaces the shared one. Two distinct
    /// codes resolving to one label on the same endpoint is an error.
    pub fn from_specs(
        shared: &[(&'static str, &'static str)],
        specs: &[EndpointSpec],
    ) -> PipelineResult<Self> {
        let mut map = Self::default();

        for spec in specs {
            let endpoint = EndpointId::new(spec.code);
            let mut resolved: Vec<(&'static str, &'static str)> = Vec::new();

            for &(code, label) in shared.iter().chain(spec.fields.iter()) {
                match resolved.iter_mut().find(|(c, _)| *c == code) {
                    Some(existing) => existing.1 = label,
                    None => resolved.push((code, label)),
                }
            }

            let mut by_label: HashMap<&str, &str> = HashMap::new();
            for &(code, label) in &resolved {
                if let Some(first) = by_label.insert(label, code) {
                    return Err(PipelineError::LabelCollision {
                        endpoint: endpoint.to_string(),
                        label: label.to_string(),
                        first: first.to_string(),
                        second: code.to_string(),
                    });
                }
            }

            for (code, label) in resolved {
                map.entries
                    .insert((endpoint.clone(), code.to_string()), label.to_string());
            }
            map.endpoints.insert(endpoint);
        }

        Ok(map)
    }

    /// Returns true if any entries exist for the endpoint.
    pub fn has_endpoint(&self, endpoint: &EndpointId) -> bool {
        self.endpoints.contains(endpoint)
    }

    /// Canonical label for a code on an endpoint.
    pub fn label(&self, endpoint: &EndpointId, code: &str) -> Option<&str> {
        self.entries
            .get(&(endpoint.clone(), code.to_string()))
            .map(String::as_str)
    }

    /// Renames the columns of `table` to their canonical labels.
    ///
    /// Codes without an entry pass through under their original name. Row
    /// content and order are untouched and the input is not modified.
    pub fn normalize(&self, table: &Table, endpoint: &EndpointId) -> PipelineResult<Table> {
        if !self.has_endpoint(endpoint) {
            return Err(PipelineError::UnknownEndpoint(endpoint.to_string()));
        }

        let mut sources: HashMap<&str, &str> = HashMap::new();
        let mut columns = Vec::with_capacity(table.columns().len());

        for code in table.columns() {
            let label = self.label(endpoint, code).unwrap_or(code.as_str());
            if let Some(first) = sources.insert(label, code.as_str()) {
                return Err(PipelineError::LabelCollision {
                    endpoint: endpoint.to_string(),
                    label: label.to_string(),
                    first: first.to_string(),
                    second: code.to_string(),
                });
            }
            columns.push(label.to_string());
        }

        Ok(table.with_columns(columns))
    }

    /// Pairs each raw column code with its label, if one is registered.
    pub fn describe_columns<'a>(
        &self,
        table: &'a Table,
        endpoint: &EndpointId,
    ) -> Vec<(&'a str, Option<String>)> {
        table
            .columns()
            .iter()
            .map(|code| {
                (
                    code.as_str(),
                    self.label(endpoint, code).map(str::to_string),
                )
            })
            .collect()
    }
}
