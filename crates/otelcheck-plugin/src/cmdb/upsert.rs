//! Identification engine submission.

use async_trait::async_trait;
use serde::Deserialize;

use otelcheck_core::error::{CheckError, Result};

use crate::cmdb::payload::IrePayload;
use crate::config::CmdbSection;

const IRE_PATH: &str = "/api/now/identifyreconcile";

/// Opaque upsert target for a projected batch.
#[async_trait]
pub trait UpsertSink: Send + Sync {
    async fn upsert(&self, payload: &IrePayload) -> Result<UpsertReport>;
}

/// Per-item outcome returned by the engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertReport {
    #[serde(default)]
    pub items: Vec<Outcome>,
    #[serde(default)]
    pub relations: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Outcome {
    #[serde(rename = "className", default)]
    pub class_name: String,
    #[serde(default)]
    pub operation: String,
    #[serde(rename = "sysId", default)]
    pub sys_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<OutcomeError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl UpsertReport {
    /// Items and relations the engine reported errors for.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.items
            .iter()
            .chain(self.relations.iter())
            .filter(|o| !o.errors.is_empty())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

#[derive(Deserialize)]
struct ResultEnvelope {
    result: UpsertReport,
}

/// REST client for the instance's identify-and-reconcile endpoint.
#[derive(Debug, Clone)]
pub struct IdentificationEngineClient {
    http: reqwest::Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
}

impl IdentificationEngineClient {
    pub fn from_config(cfg: &CmdbSection) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| CheckError::Upsert(format!("http client init failed: {e}")))?;

        let base = cfg.url.trim_end_matches('/');
        Ok(Self {
            http,
            endpoint: format!("{base}{IRE_PATH}?sysparm_data_source={}", cfg.data_source),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl UpsertSink for IdentificationEngineClient {
    async fn upsert(&self, payload: &IrePayload) -> Result<UpsertReport> {
        let mut req = self.http.post(&self.endpoint).json(payload);
        if let Some(user) = &self.username {
            req = req.basic_auth(user, self.password.as_ref());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| CheckError::Upsert(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckError::Upsert(format!("{status}: {body}")));
        }

        let envelope: ResultEnvelope = resp
            .json()
            .await
            .map_err(|e| CheckError::Upsert(format!("invalid response body: {e}")))?;

        Ok(envelope.result)
    }
}

/// Submit one batch and log the engine's verdict. Per-item errors are logged
/// but do not fail the batch; only a failed call does.
pub async fn submit(sink: &dyn UpsertSink, payload: &IrePayload) -> Result<UpsertReport> {
    let report = sink.upsert(payload).await?;

    tracing::info!(
        items = report.items.len(),
        relations = report.relations.len(),
        "IRE result"
    );
    for failed in report.failures() {
        for err in &failed.errors {
            tracing::warn!(
                class = %failed.class_name,
                operation = %failed.operation,
                error = %err.error,
                message = %err.message,
                "IRE rejected entry"
            );
        }
    }

    Ok(report)
}
