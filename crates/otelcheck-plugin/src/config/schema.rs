use std::time::Duration;

use serde::Deserialize;
use otelcheck_core::error::{CheckError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    pub version: u32,

    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub fetch: FetchSection,

    #[serde(default)]
    pub cmdb: Option<CmdbSection>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            version: 1,
            relay: RelaySection::default(),
            fetch: FetchSection::default(),
            cmdb: None,
        }
    }
}

impl CheckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CheckError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.relay.validate()?;
        self.fetch.validate()?;
        if let Some(cmdb) = &self.cmdb {
            cmdb.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Per-connection read timeout. Unset means a client may stay idle for
    /// as long as the process lives.
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,

    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            idle_timeout_ms: None,
            sink_capacity: default_sink_capacity(),
        }
    }
}

impl RelaySection {
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == Some(0) {
            return Err(CheckError::Config(
                "relay.idle_timeout_ms must be greater than 0 (omit it to disable)".into(),
            ));
        }
        if !(1..=1_000_000).contains(&self.sink_capacity) {
            return Err(CheckError::Config(
                "relay.sink_capacity must be between 1 and 1000000".into(),
            ));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    #[serde(default = "default_metrics_path")]
    pub path: String,

    #[serde(default)]
    pub collector: Option<CollectorLaunch>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            collector: None,
        }
    }
}

impl FetchSection {
    pub fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(CheckError::Config("fetch.path must start with '/'".into()));
        }
        if let Some(c) = &self.collector {
            c.validate()?;
        }
        Ok(())
    }
}

/// Collector process to start when it is not already running.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorLaunch {
    pub process_name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl CollectorLaunch {
    pub fn validate(&self) -> Result<()> {
        if self.process_name.trim().is_empty() {
            return Err(CheckError::Config("fetch.collector.process_name must not be empty".into()));
        }
        if self.command.trim().is_empty() {
            return Err(CheckError::Config("fetch.collector.command must not be empty".into()));
        }
        if self.settle_ms > 60_000 {
            return Err(CheckError::Config(
                "fetch.collector.settle_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CmdbSection {
    /// Instance base url, e.g. `https://example.service-now.com`.
    pub url: String,

    #[serde(default = "default_data_source")]
    pub data_source: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_cmdb_timeout_ms")]
    pub timeout_ms: u64,
}

impl CmdbSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(CheckError::Config("cmdb.url must be an http(s) url".into()));
        }
        if self.data_source.is_empty()
            || !self
                .data_source
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CheckError::Config(
                "cmdb.data_source must be non-empty [A-Za-z0-9_-]".into(),
            ));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(CheckError::Config("cmdb.password requires cmdb.username".into()));
        }
        if !(1000..=300_000).contains(&self.timeout_ms) {
            return Err(CheckError::Config(
                "cmdb.timeout_ms must be between 1000 and 300000".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_sink_capacity() -> usize {
    1024
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_settle_ms() -> u64 {
    5000
}
fn default_data_source() -> String {
    "ServiceNow".into()
}
fn default_cmdb_timeout_ms() -> u64 {
    30_000
}
