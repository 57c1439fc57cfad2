//! HTTP client for the school disclosure open-data API.
//!
//! One request returns one page of JSON records. There is no retry,
//! pagination or caching; callers decide what to do with a failure.

use crate::models::{Cell, Table};
use crate::schema::{EndpointId, SchoolLevel};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SUCCESS_CODE: &str = "success";

/// Connection settings for the upstream API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

/// Reasons a fetch produced no table.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("upstream reported an error: {0}")]
    Api(String),
}

/// Result of a successful round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Records in upstream column order.
    Rows(Table),
    /// The request succeeded but matched nothing.
    NoData,
}

/// Response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "resultCode")]
    result_code: Option<String>,
    #[serde(rename = "resultMsg")]
    result_msg: Option<String>,
    #[serde(default)]
    list: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

/// Decodes a response body into a table.
pub fn parse_response(body: &str) -> Result<FetchOutcome, FetchError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    match response.result_code.as_deref() {
        Some(SUCCESS_CODE) => {}
        other => {
            let message = response
                .result_msg
                .or_else(|| other.map(str::to_string))
                .unwrap_or_else(|| "missing resultCode".to_string());
            return Err(FetchError::Api(message));
        }
    }

    let records = match response.list {
        Some(list) if !list.is_empty() => list,
        _ => return Ok(FetchOutcome::NoData),
    };

    let table = Table::from_records(records.into_iter().map(|record| {
        record
            .into_iter()
            .map(|(key, value)| (key, Cell::from(value)))
            .collect::<Vec<_>>()
    }));

    Ok(FetchOutcome::Rows(table))
}

/// Client bound to one [`ApiConfig`].
pub struct SchoolInfoClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl SchoolInfoClient {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Builds the request URL for one endpoint, level and year.
    pub fn request_url(
        &self,
        endpoint: &EndpointId,
        level: SchoolLevel,
        year: u16,
    ) -> Result<reqwest::Url, FetchError> {
        let year = year.to_string();
        reqwest::Url::parse_with_params(
            &self.config.base_url,
            &[
                ("apiKey", self.config.api_key.as_str()),
                ("apiType", endpoint.as_str()),
                ("pbanYr", year.as_str()),
                ("schulKndCode", level.code()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.config.base_url, e)))
    }

    /// Fetches a single page of records.
    pub async fn fetch_rows(
        &self,
        endpoint: &EndpointId,
        level: SchoolLevel,
        year: u16,
    ) -> Result<FetchOutcome, FetchError> {
        let url = self.request_url(endpoint, level, year)?;
        info!(
            "Requesting endpoint {} ({} schools, {}) from {}",
            endpoint, level, year, self.config.base_url
        );

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("Response body: {} bytes", body.len());

        let outcome = parse_response(&body)?;
        match &outcome {
            FetchOutcome::Rows(table) => info!(
                "Received {} rows with {} columns",
                table.row_count(),
                table.columns().len()
            ),
            FetchOutcome::NoData => info!("No rows matched the request"),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            api_key: "secret key".to_string(),
            timeout_seconds: 5,
            accept_invalid_certs: false,
        }
    }

    #[test]
    fn test_parse_response_rows_keep_column_order() {
        let body = r#"{
            "resultCode": "success",
            "resultMsg": "ok",
            "list": [
                {"SCHUL_NM": "가람초", "COL_1": 1, "COL_2": "2"},
                {"SCHUL_NM": "나래초", "COL_1": null, "EXTRA": "x"}
            ]
        }"#;

        let outcome = parse_response(body).unwrap();
        let FetchOutcome::Rows(table) = outcome else {
            panic!("expected rows");
        };

        assert_eq!(table.columns(), &["SCHUL_NM", "COL_1", "COL_2", "EXTRA"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][1], Cell::Number(1.0));
        assert_eq!(table.rows()[1][1], Cell::Null);
        assert_eq!(table.rows()[1][2], Cell::Null);
    }

    #[test]
    fn test_parse_response_empty_list_is_no_data() {
        let outcome = parse_response(r#"{"resultCode": "success", "list": []}"#).unwrap();
        assert_eq!(outcome, FetchOutcome::NoData);

        let outcome = parse_response(r#"{"resultCode": "success"}"#).unwrap();
        assert_eq!(outcome, FetchOutcome::NoData);
    }

    #[test]
    fn test_parse_response_api_error() {
        let err = parse_response(r#"{"resultCode": "fail", "resultMsg": "invalid key"}"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::Api(ref m) if m == "invalid key"));
    }

    #[test]
    fn test_parse_response_garbage() {
        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_request_url() {
        let client = SchoolInfoClient::new(test_config("https://example.org/openApi.do")).unwrap();
        let url = client
            .request_url(&EndpointId::new("22"), SchoolLevel::Middle, 2024)
            .unwrap();

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.contains(&("apiType".to_string(), "22".to_string())));
        assert!(query.contains(&("pbanYr".to_string(), "2024".to_string())));
        assert!(query.contains(&("schulKndCode".to_string(), "03".to_string())));
        assert!(query.contains(&("apiKey".to_string(), "secret key".to_string())));
    }

    #[test]
    fn test_request_url_invalid_base() {
        let client = SchoolInfoClient::new(test_config("not a url")).unwrap();
        let err = client
            .request_url(&EndpointId::new("22"), SchoolLevel::High, 2024)
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_transport_error() {
        let client = SchoolInfoClient::new(test_config("http://127.0.0.1:9/openApi.do")).unwrap();
        let err = client
            .fetch_rows(&EndpointId::new("22"), SchoolLevel::High, 2024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
