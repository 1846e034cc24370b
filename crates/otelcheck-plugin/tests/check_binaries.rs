#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::PathBuf;
use std::process::Output;

use axum::{routing::get, Router};
use tokio::process::Command;

const RELAY: &str = env!("CARGO_BIN_EXE_otel-metric-relay");
const COLLECTOR: &str = env!("CARGO_BIN_EXE_otel-metric-collector");
const CI_CREATE: &str = env!("CARGO_BIN_EXE_ci-create");

/// Port nothing listens on.
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("otelcheck-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

async fn run_quiet(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .await
        .unwrap()
}

fn assert_critical(out: &Output, check: &str) {
    assert_eq!(out.status.code(), Some(2), "{out:?}");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.starts_with(&format!("{check} CRITICAL: ")),
        "unexpected stderr: {stderr}"
    );
}

#[tokio::test]
async fn collector_exits_critical_when_exporter_is_down() {
    let port = closed_port().await.to_string();
    let out = run_quiet(
        COLLECTOR,
        &["--host", "127.0.0.1", "--port", port.as_str(), "--timeout", "2"],
    )
    .await;

    assert_critical(&out, "CollectOTelMetrics");
    assert!(out.stdout.is_empty());
}

#[tokio::test]
async fn collector_prints_lines_and_stays_silent_on_success() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    let app = Router::new().route(
        "/metrics",
        get(|| async { "# TYPE foo_bar gauge\nfoo_bar{job=\"x\"} 1 2000\n" }),
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let out = Command::new(COLLECTOR)
        .args(["--host", "127.0.0.1", "--port", port.as_str(), "--timeout", "5"])
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap();

    assert!(out.status.success(), "{out:?}");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "foo-bar;job=x 1 2\n");
    assert!(out.stderr.is_empty(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[tokio::test]
async fn relay_exits_critical_on_bind_conflict() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    let out = run_quiet(
        RELAY,
        &["--host", "127.0.0.1", "--port", port.as_str(), "--timeout", "1"],
    )
    .await;

    assert_critical(&out, "OTelMetricRelay");
    drop(taken);
}

#[tokio::test]
async fn relay_exits_cleanly_when_lifetime_elapses() {
    let out = Command::new(RELAY)
        .args(["--host", "127.0.0.1", "--port", "0", "--timeout", "0.3"])
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap();

    assert!(out.status.success(), "{out:?}");
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[tokio::test]
async fn bad_config_is_critical() {
    let missing = std::env::temp_dir().join("otelcheck-does-not-exist.yaml");
    let out = run_quiet(
        RELAY,
        &["--port", "0", "--config", missing.to_str().unwrap()],
    )
    .await;
    assert_critical(&out, "OTelMetricRelay");

    let cfg = scratch_file("bad-version.yaml", "version: 2\n");
    let out = run_quiet(COLLECTOR, &["--config", cfg.to_str().unwrap()]).await;
    assert_critical(&out, "CollectOTelMetrics");

    let out = run_quiet(COLLECTOR, &["--timeout", "0"]).await;
    assert_critical(&out, "CollectOTelMetrics");
}

#[tokio::test]
async fn ci_create_dry_run_prints_payload() {
    let input = scratch_file(
        "batch.json",
        r#"[{"check":{"output":"m;client=A;server=B 1 1722965304"}}]"#,
    );
    let out = Command::new(CI_CREATE)
        .args(["--dry-run", "--input", input.to_str().unwrap()])
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap();

    assert!(out.status.success(), "{out:?}");
    let payload: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(payload["items"].as_array().unwrap().len(), 2);
    assert_eq!(payload["relations"][0]["type"], "Depends on::Used by");
}

#[tokio::test]
async fn ci_create_exits_critical_when_upsert_fails() {
    let port = closed_port().await;
    let cfg = scratch_file(
        "cmdb.yaml",
        &format!("version: 1\ncmdb:\n  url: http://127.0.0.1:{port}\n  timeout_ms: 2000\n"),
    );
    let input = scratch_file(
        "upsert-batch.json",
        r#"[{"check":{"output":"m;client=A;server=B 1 1722965304"}}]"#,
    );

    let out = run_quiet(
        CI_CREATE,
        &[
            "--config",
            cfg.to_str().unwrap(),
            "--input",
            input.to_str().unwrap(),
        ],
    )
    .await;
    assert_critical(&out, "OpenTelemetryDiscovery");
}

#[tokio::test]
async fn ci_create_rejects_unreadable_batch() {
    let input = scratch_file("not-json.json", "{ nope");
    let out = run_quiet(CI_CREATE, &["--dry-run", "--input", input.to_str().unwrap()]).await;
    assert_critical(&out, "OpenTelemetryDiscovery");
}
