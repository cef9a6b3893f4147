use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

use super::QueryExecutor;
use crate::{
    config::WavefrontConfig,
    metrics,
    models::{TranslatedQuery, UpstreamResponse},
    ProxyError, Result,
};

const CHART_API_PATH: &str = "/api/v2/chart/api";

/// Client for the Wavefront chart API.
pub struct WavefrontClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl WavefrontClient {
    pub fn new(config: &WavefrontConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url(&config.address),
            token: config.token.clone(),
        })
    }

    pub fn chart_url(&self) -> String {
        format!("{}{}", self.base_url, CHART_API_PATH)
    }
}

/// Wavefront addresses are usually given as a bare host name.
fn base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("https://{}", address)
    }
}

fn chart_params(query: &TranslatedQuery) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.expression.clone()),
        ("s", query.start_ms.to_string()),
        ("e", query.end_ms.to_string()),
        ("g", query.granularity.as_param().to_string()),
        ("i", "false".to_string()),
        ("strict", "true".to_string()),
        ("summarization", "MEAN".to_string()),
        ("listMode", "true".to_string()),
        ("autoEvents", "false".to_string()),
    ]
}

#[async_trait]
impl QueryExecutor for WavefrontClient {
    async fn execute(&self, query: &TranslatedQuery) -> Result<UpstreamResponse> {
        debug!(
            "Querying wavefront: q={} s={} e={}",
            query.expression, query.start_ms, query.end_ms
        );
        let started = Instant::now();

        let response = self
            .http
            .get(self.chart_url())
            .bearer_auth(&self.token)
            .query(&chart_params(query))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        metrics::record_upstream_duration(started.elapsed().as_secs_f64());

        if !status.is_success() {
            // Query errors come back with an error status but a readable body.
            if let Ok(upstream) = serde_json::from_str::<UpstreamResponse>(&body) {
                if upstream.error().is_some() {
                    return Ok(upstream);
                }
            }
            warn!("Wavefront returned {}: {}", status, body);
            return Err(ProxyError::Transport(format!(
                "server returned {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
