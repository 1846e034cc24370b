use std::error::Error as _;
use std::time::Duration;

use otelcheck_core::error::{CheckError, Result};
use otelcheck_core::protocol::exposition;

use crate::fetch::guard::DependencyGuard;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9090;

#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    url: String,
}

impl FetchClient {
    pub fn new(host: &str, port: u16, path: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckError::Fetch(format!("http client init failed: {e}")))?;

        Ok(Self {
            http,
            url: format!("http://{host}:{port}{path}"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the exposition body once and return the converted lines in order.
    pub async fn fetch_once(&self) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CheckError::Fetch(transport_reason(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CheckError::Fetch(status.to_string()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| CheckError::Fetch(transport_reason(&e)))?;

        Ok(convert_body(&body))
    }
}

/// Convert an exposition body, skipping blanks, `#` comments, and lines the
/// codec rejects.
pub fn convert_body(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match exposition::convert(line) {
            Ok(out) => Some(out),
            Err(e) => {
                tracing::debug!(error = %e, "skipping exposition line");
                None
            }
        })
        .collect()
}

/// Run the guard, then fetch. When the guard had to start the collector the
/// endpoint may still be warming up, so one failed fetch is retried after the
/// settle delay.
pub async fn fetch_with_guard(
    client: &FetchClient,
    guard: &dyn DependencyGuard,
) -> Result<Vec<String>> {
    let launched = guard.ensure_running().await?;
    match client.fetch_once().await {
        Err(e) if launched => {
            tracing::warn!(url = %client.url(), error = %e, "fetch failed after collector launch; retrying once");
            tokio::time::sleep(guard.settle()).await;
            client.fetch_once().await
        }
        other => other,
    }
}

fn transport_reason(e: &reqwest::Error) -> String {
    let mut reason = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        reason.push_str(": ");
        reason.push_str(&inner.to_string());
        source = inner.source();
    }
    reason
}
