//! otel-metric-collector
//!
//! Scrapes the collector's Prometheus exporter once and prints every metric
//! in line protocol. Exits 2 with a CRITICAL message when the scrape fails.

use std::process::ExitCode;

use clap::Parser;
use tokio::io::AsyncWriteExt;

use otelcheck_core::error::{CheckError, Result};
use otelcheck_plugin::cli::{self, CollectorCli};
use otelcheck_plugin::config;
use otelcheck_plugin::fetch::{fetch_with_guard, FetchClient, ProcessGuard};

const CHECK: &str = "CollectOTelMetrics";

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_logging();
    let args = CollectorCli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::critical(CHECK, &e),
    }
}

async fn run(args: CollectorCli) -> Result<()> {
    let cfg = config::load_optional(args.config.as_deref())?;
    let timeout = cli::timeout_duration(args.timeout)?;
    let client = FetchClient::new(&args.host, args.port, &cfg.fetch.path, timeout)?;

    let lines = match &cfg.fetch.collector {
        Some(launch) => fetch_with_guard(&client, &ProcessGuard::new(launch.clone())).await?,
        None => client.fetch_once().await?,
    };
    tracing::debug!(url = %client.url(), lines = lines.len(), "scrape converted");

    let mut out = String::new();
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(out.as_bytes())
        .await
        .map_err(|e| CheckError::Fetch(format!("stdout write failed: {e}")))?;
    stdout
        .flush()
        .await
        .map_err(|e| CheckError::Fetch(format!("stdout write failed: {e}")))?;

    Ok(())
}
