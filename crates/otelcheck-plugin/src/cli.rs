//! Shared plumbing for the check binaries: argument structs, logging setup,
//! and the plugin exit convention.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use otelcheck_core::error::{CheckError, Result};

use crate::{fetch, relay};

/// Default `--timeout` in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Exit status for a failed check (monitoring "critical").
pub const EXIT_CRITICAL: u8 = 2;

/// Relay collector-pushed line protocol to stdout for `--timeout` seconds.
#[derive(Debug, Parser)]
#[command(name = "otel-metric-relay", version, about)]
pub struct RelayCli {
    /// Seconds to accept connections for
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: f64,

    /// Bind address
    #[arg(long, default_value = relay::server::DEFAULT_HOST)]
    pub host: String,

    /// Bind port
    #[arg(long, default_value_t = relay::server::DEFAULT_PORT)]
    pub port: u16,

    /// Optional YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Scrape the collector's Prometheus exporter once and print line protocol.
#[derive(Debug, Parser)]
#[command(name = "otel-metric-collector", version, about)]
pub struct CollectorCli {
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: f64,

    /// Exporter host
    #[arg(long, default_value = fetch::client::DEFAULT_HOST)]
    pub host: String,

    /// Exporter port
    #[arg(long, default_value_t = fetch::client::DEFAULT_PORT)]
    pub port: u16,

    /// Optional YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Turn client/server metric labels into CMDB service CIs and relations.
#[derive(Debug, Parser)]
#[command(name = "ci-create", version, about)]
pub struct CiCreateCli {
    /// JSON array of check results (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print the payload instead of submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Optional YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Logs go to stderr; stdout carries metric lines only.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn timeout_duration(secs: f64) -> Result<Duration> {
    if secs <= 0.0 {
        return Err(CheckError::Config(format!("--timeout must be positive, got {secs}")));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| CheckError::Config(format!("--timeout {secs}: {e}")))
}

/// Report a failed run the way monitoring agents expect.
pub fn critical(check: &str, err: &CheckError) -> ExitCode {
    tracing::error!(check, kind = err.kind().as_str(), error = %err, "check failed");
    eprintln!("{check} CRITICAL: {err}");
    ExitCode::from(EXIT_CRITICAL)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, stopping");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_must_be_positive() {
        assert!(timeout_duration(0.0).is_err());
        assert!(timeout_duration(-1.0).is_err());
        assert!(timeout_duration(f64::NAN).is_err());
        assert_eq!(timeout_duration(1.5).ok(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn relay_defaults() {
        let cli = RelayCli::parse_from(["otel-metric-relay"]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 2003);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn collector_overrides() {
        let cli = CollectorCli::parse_from([
            "otel-metric-collector",
            "--host",
            "otel.local",
            "--port",
            "8889",
            "--timeout",
            "2.5",
        ]);
        assert_eq!(cli.host, "otel.local");
        assert_eq!(cli.port, 8889);
        assert_eq!(cli.timeout, 2.5);
    }
}
