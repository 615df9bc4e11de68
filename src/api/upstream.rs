//! Implements the `CostSource` trait against an external cost API over HTTP.

use crate::api::CostSource;
use crate::model::{CostRow, DailyCost, Resource, UtilSample, Window};
use crate::movers::normalize_rows;
use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// A `CostSource` backed by the upstream cost API. The cost-by-service
/// endpoint's response shape is not guaranteed stable, so its rows go through
/// `normalize_rows` before any computation sees them.
pub struct UpstreamSource {
    base: String,
    client: reqwest::Client,
}

impl UpstreamSource {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // Validate early so a typo fails at startup, not on first request.
        url::Url::parse(base_url)
            .with_context(|| format!("Invalid upstream cost API URL '{base_url}'"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the upstream HTTP client")?;
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base);
        trace!("GET {url}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach the upstream cost API at {url}"))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("Upstream cost API returned an error for {url}"))?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse the upstream response from {url}"))
    }
}

#[async_trait::async_trait]
impl CostSource for UpstreamSource {
    async fn costs_by_service(&self, window: Window) -> Result<Vec<CostRow>> {
        let payload: Value = self
            .get("costs", &[("window", window.to_string())])
            .await?;
        Ok(normalize_rows(extract_rows(&payload)))
    }

    async fn daily_costs(&self, window: Window) -> Result<Vec<DailyCost>> {
        self.get("costs/daily", &[("window", window.to_string())])
            .await
    }

    async fn resources(&self) -> Result<Vec<Resource>> {
        self.get("resources", &[]).await
    }

    async fn utilization(&self) -> Result<Vec<UtilSample>> {
        self.get("utilization", &[]).await
    }
}

/// The upstream has been seen returning both a bare JSON array and an object
/// wrapping the rows in `items`.
fn extract_rows(payload: &Value) -> &[Value] {
    payload
        .as_array()
        .or_else(|| payload.get("items").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(UpstreamSource::new("not a url", Duration::from_secs(1)).is_err());
        assert!(UpstreamSource::new("https://cost-api.example.com", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_extract_rows_accepts_bare_array_and_items_wrapper() {
        let bare = json!([{"service": "EC2", "amount": 1.0}]);
        assert_eq!(extract_rows(&bare).len(), 1);

        let wrapped = json!({"items": [{"service": "EC2"}, {"service": "S3"}]});
        assert_eq!(extract_rows(&wrapped).len(), 2);

        let neither = json!({"rows": []});
        assert!(extract_rows(&neither).is_empty());
    }
}
