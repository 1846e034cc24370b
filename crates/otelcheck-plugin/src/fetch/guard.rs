//! "Ensure the collector is running" seam for the fetch check.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::System;

use otelcheck_core::error::{CheckError, Result};

use crate::config::CollectorLaunch;

#[async_trait]
pub trait DependencyGuard: Send + Sync {
    /// Make sure the dependency is up. Returns `true` when it had to be
    /// started during this call.
    async fn ensure_running(&self) -> Result<bool>;

    /// Delay to give a freshly started dependency before it is usable.
    fn settle(&self) -> Duration;
}

/// Guard for setups where the collector is supervised elsewhere.
#[derive(Debug, Default)]
pub struct NoopGuard;

#[async_trait]
impl DependencyGuard for NoopGuard {
    async fn ensure_running(&self) -> Result<bool> {
        Ok(false)
    }

    fn settle(&self) -> Duration {
        Duration::ZERO
    }
}

/// Looks the collector up by exact process name and starts it detached when
/// missing. Launch is best-effort: a failed spawn is logged and the fetch
/// reports the real outcome.
#[derive(Debug, Clone)]
pub struct ProcessGuard {
    launch: CollectorLaunch,
}

impl ProcessGuard {
    pub fn new(launch: CollectorLaunch) -> Self {
        Self { launch }
    }

    async fn is_running(&self) -> Result<bool> {
        let name = self.launch.process_name.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = System::new();
            sys.refresh_processes();
            let found = sys.processes_by_exact_name(&name).next().is_some();
            found
        })
        .await
        .map_err(|e| CheckError::Fetch(format!("process lookup failed: {e}")))
    }

    fn spawn(&self) -> std::io::Result<()> {
        tokio::process::Command::new(&self.launch.command)
            .args(&self.launch.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
    }
}

#[async_trait]
impl DependencyGuard for ProcessGuard {
    async fn ensure_running(&self) -> Result<bool> {
        if self.is_running().await? {
            return Ok(false);
        }

        tracing::info!(
            process = %self.launch.process_name,
            command = %self.launch.command,
            "collector not running; launching"
        );
        if let Err(e) = self.spawn() {
            tracing::warn!(command = %self.launch.command, error = %e, "collector launch failed");
            return Ok(false);
        }

        tokio::time::sleep(self.settle()).await;
        Ok(true)
    }

    fn settle(&self) -> Duration {
        self.launch.settle()
    }
}
