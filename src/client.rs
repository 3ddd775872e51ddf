use crate::dates::format_iso;
use crate::error::DashboardError;
use crate::models::{PerformanceEnvelope, TradeRecord, WatermarkResponse};
use crate::records::normalize_records;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 2048;

/// Thin async wrapper over the dashboard's REST endpoints.
#[derive(Clone, Debug)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DashboardClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;
        Self::with_http_client(http, base_url)
            .with_context(|| format!("invalid dashboard base URL {}", base_url))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
    ) -> Result<Self, DashboardError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|err| DashboardError::Config(format!("{}: {}", base_url, err)))?;
        if parsed.cannot_be_a_base() {
            return Err(DashboardError::Config(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `GET /performance?from&to&is_active=false`, unwrapped to the trade list.
    pub async fn fetch_performance(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TradeRecord>, DashboardError> {
        let mut url = self.endpoint(&["performance"]);
        url.query_pairs_mut()
            .append_pair("from", &format_iso(from))
            .append_pair("to", &format_iso(to))
            .append_pair("is_active", "false");
        let display = url.to_string();

        let body = self.get_json(url).await?;
        let envelope: PerformanceEnvelope = serde_json::from_value(body).map_err(|err| {
            DashboardError::malformed(
                &display,
                format!("expected {{performance: {{response: [...]}}}}: {}", err),
            )
        })?;
        debug!(
            "Fetched {} performance record(s) from {}",
            envelope.performance.response.len(),
            display
        );
        Ok(envelope.performance.response)
    }

    pub async fn fetch_watermarks(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<WatermarkResponse, DashboardError> {
        let mut url = self.endpoint(&["watermarks"]);
        url.query_pairs_mut()
            .append_pair("from", &format_iso(from))
            .append_pair("to", &format_iso(to));
        let display = url.to_string();

        let body = self.get_json(url).await?;
        if !body.is_object() {
            return Err(DashboardError::malformed(
                &display,
                "expected an object with a watermarks array",
            ));
        }
        let response: WatermarkResponse = serde_json::from_value(body)
            .map_err(|err| DashboardError::malformed(&display, err.to_string()))?;
        debug!(
            "Fetched {} watermark sample(s) from {}",
            response.watermarks.len(),
            display
        );
        Ok(response)
    }

    /// Raw strategy records from `/strategy/{symbol}` or, without a symbol, `/universe`.
    pub async fn fetch_records(
        &self,
        symbol: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Value>, DashboardError> {
        let mut url = match symbol.map(str::trim).filter(|s| !s.is_empty()) {
            Some(symbol) => self.endpoint(&["strategy", symbol]),
            None => self.endpoint(&["universe"]),
        };
        url.query_pairs_mut()
            .append_pair("from", &format_iso(from))
            .append_pair("to", &format_iso(to));
        let display = url.to_string();

        let body = self.get_json(url).await?;
        let records = normalize_records(&display, body)?;
        debug!("Fetched {} strategy record(s) from {}", records.len(), display);
        Ok(records)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value, DashboardError> {
        let display = url.to_string();
        let response = self.http.get(url).send().await.map_err(|err| {
            DashboardError::network(
                &display,
                err.status().map(|status| status.as_u16()),
                err.to_string(),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let details = truncate_for_log(&body, MAX_ERROR_BODY_CHARS);
            warn!(
                "Dashboard request {} returned {}: {}",
                display,
                status,
                if details.is_empty() {
                    "<empty body>"
                } else {
                    details.as_str()
                }
            );
            let details = if details.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            } else {
                details
            };
            return Err(DashboardError::network(&display, Some(status.as_u16()), details));
        }

        let text = response.text().await.map_err(|err| {
            DashboardError::network(&display, Some(status.as_u16()), err.to_string())
        })?;
        serde_json::from_str(&text).map_err(|err| {
            DashboardError::malformed(
                &display,
                format!(
                    "invalid JSON ({}): {}",
                    err,
                    truncate_for_log(&text, MAX_ERROR_BODY_CHARS)
                ),
            )
        })
    }
}

fn truncate_for_log(value: &str, max_chars: usize) -> String {
    let trimmed = value.trim();
    let mut iter = trimmed.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = iter.next() else {
            return trimmed.to_string();
        };
        out.push(ch);
    }
    if iter.next().is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> DashboardClient {
        DashboardClient::with_http_client(reqwest::Client::new(), base).unwrap()
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let api = client("https://example.com/api/");
        assert_eq!(
            api.endpoint(&["performance"]).as_str(),
            "https://example.com/api/performance"
        );

        let root = client("http://localhost:8000");
        assert_eq!(
            root.endpoint(&["strategy", "BRK/B"]).as_str(),
            "http://localhost:8000/strategy/BRK%2FB"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            DashboardClient::with_http_client(reqwest::Client::new(), "not a url"),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            DashboardClient::with_http_client(reqwest::Client::new(), "mailto:ops@example.com"),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn new_validates_base_url() {
        let built = DashboardClient::new("http://localhost:8000/", Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(built.base_url(), "http://localhost:8000/");
        let err = DashboardClient::new("localhost", None).unwrap_err();
        assert!(err.to_string().contains("invalid dashboard base URL"));
    }

    #[test]
    fn truncates_long_bodies() {
        assert_eq!(truncate_for_log("  short  ", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc…");
    }
}
