//! ci-create
//!
//! Reads a JSON array of check results, projects `client`/`server` metric
//! labels into discovered-service CIs and relations, and submits them to the
//! CMDB identification engine. Without a `cmdb` config section (or with
//! `--dry-run`) the payload is printed instead.
//!
//! A failed submission (unreachable engine, non-2xx reply) exits 2 with a
//! CRITICAL message, like every other fatal error; nothing from the batch is
//! recorded in that case. Per-item errors in an accepted reply are only
//! logged and the run still succeeds.

use std::process::ExitCode;

use clap::Parser;
use tokio::io::AsyncReadExt;

use otelcheck_core::error::{CheckError, Result};
use otelcheck_plugin::cli::{self, CiCreateCli};
use otelcheck_plugin::cmdb::{self, CheckResult, IdentificationEngineClient};
use otelcheck_plugin::config;

const CHECK: &str = "OpenTelemetryDiscovery";

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_logging();
    let args = CiCreateCli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::critical(CHECK, &e),
    }
}

async fn run(args: CiCreateCli) -> Result<()> {
    let cfg = config::load_optional(args.config.as_deref())?;

    let raw = match &args.input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CheckError::Input(format!("read {} failed: {e}", path.display())))?,
        None => {
            let mut s = String::new();
            tokio::io::stdin()
                .read_to_string(&mut s)
                .await
                .map_err(|e| CheckError::Input(format!("read stdin failed: {e}")))?;
            s
        }
    };

    let checks: Vec<CheckResult> =
        serde_json::from_str(&raw).map_err(|e| CheckError::Input(e.to_string()))?;
    tracing::info!(checks = checks.len(), "processing checks");

    let payload = cmdb::project(checks.iter().map(|c| c.check.output.as_str()));
    let json = serde_json::to_string(&payload)
        .map_err(|e| CheckError::Upsert(format!("payload encode failed: {e}")))?;
    tracing::info!(payload = %json, "IRE payload");

    let cmdb_cfg = match &cfg.cmdb {
        Some(c) if !args.dry_run => c,
        _ => {
            println!("{json}");
            return Ok(());
        }
    };

    if payload.is_empty() {
        tracing::info!("no services discovered; nothing to submit");
        return Ok(());
    }

    let client = IdentificationEngineClient::from_config(cmdb_cfg)?;
    cmdb::submit(&client, &payload).await?;
    Ok(())
}
