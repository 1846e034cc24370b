//! otel-metric-relay
//!
//! Listens for the collector's carbon exporter, prints every received line
//! to stdout and echoes it to the sender. Accepts connections for
//! `--timeout` seconds, then waits for open connections and exits. SIGINT or
//! SIGTERM stops accepting and closes open connections; a signal while
//! waiting after the deadline does the same.

use std::process::ExitCode;

use clap::Parser;

use otelcheck_core::error::Result;
use otelcheck_plugin::cli::{self, RelayCli};
use otelcheck_plugin::config;
use otelcheck_plugin::relay::{OutputSink, RelayConfig, RelayServer, RelayStats};

const CHECK: &str = "OTelMetricRelay";

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_logging();
    let args = RelayCli::parse();

    match run(args).await {
        Ok(stats) => {
            tracing::debug!(
                connections = stats.connections,
                lines = stats.lines,
                failed = stats.failed_connections,
                "relay finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => cli::critical(CHECK, &e),
    }
}

async fn run(args: RelayCli) -> Result<RelayStats> {
    let cfg = config::load_optional(args.config.as_deref())?;
    let lifetime = cli::timeout_duration(args.timeout)?;

    let relay_cfg = RelayConfig::new(args.host, args.port, lifetime)
        .with_idle_timeout(cfg.relay.idle_timeout());

    let (sink, writer) = OutputSink::spawn_writer(cfg.relay.sink_capacity, tokio::io::stdout());
    let server = RelayServer::bind(relay_cfg, sink).await?;

    let stats = server
        .serve(cli::shutdown_signal())
        .await
        .drain_until(cli::shutdown_signal())
        .await;

    // every sink clone is gone once drain returns, so the writer finishes
    match writer.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "stdout write failed"),
        Err(e) => tracing::warn!(error = %e, "stdout writer task aborted"),
    }

    Ok(stats)
}
