#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Router};

use otelcheck_core::error::Result;
use otelcheck_plugin::fetch::{fetch_with_guard, DependencyGuard, FetchClient, NoopGuard};

const EXPOSITION: &str = "\
# HELP otelcol_process_uptime Uptime of the process
# TYPE otelcol_process_uptime counter
otelcol_process_uptime{service_instance_id=\"abc\",service_name=\"otelcol\"} 42.5 1722967059000

system_cpu_load_average_15m 0.33 1722967059000
histogram_without_timestamp_bucket{le=\"+Inf\"} 7
traces_service_graph_request_total{client=\"telemetrygen\",server=\"telemetrygen-server\"} 22 1722965304000
";

async fn serve_router(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, path: &str, timeout: Duration) -> FetchClient {
    FetchClient::new("127.0.0.1", addr.port(), path, timeout).unwrap()
}

#[tokio::test]
async fn converts_scrape_in_order() {
    let app = Router::new().route("/metrics", get(|| async { EXPOSITION }));
    let addr = serve_router(app).await;

    let lines = client(addr, "/metrics", Duration::from_secs(5))
        .fetch_once()
        .await
        .unwrap();

    assert_eq!(
        lines,
        vec![
            "otelcol-process.uptime;service_instance_id=abc;service_name=otelcol 42.5 1722967059",
            "system-cpu.load.average.15m 0.33 1722967059",
            "traces-service.graph.request.total;client=telemetrygen;server=telemetrygen-server 22 1722965304",
        ]
    );
}

#[tokio::test]
async fn non_success_status_is_fatal() {
    let app = Router::new().route(
        "/metrics",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve_router(app).await;

    let err = client(addr, "/metrics", Duration::from_secs(5))
        .fetch_once()
        .await
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "FETCH");
    assert!(err.is_fatal());
    assert!(err.to_string().contains("500"), "{err}");

    let err = client(addr, "/nope", Duration::from_secs(5))
        .fetch_once()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404"), "{err}");
}

#[tokio::test]
async fn refused_connection_is_fetch_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr, "/metrics", Duration::from_secs(2))
        .fetch_once()
        .await
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "FETCH");
}

#[tokio::test]
async fn slow_exporter_hits_timeout() {
    let app = Router::new().route(
        "/metrics",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            EXPOSITION
        }),
    );
    let addr = serve_router(app).await;

    let err = client(addr, "/metrics", Duration::from_millis(200))
        .fetch_once()
        .await
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "FETCH");
}

/// Fails the first `fail_first` requests, then serves the exposition body.
async fn flaky(State((hits, fail_first)): State<(Arc<AtomicUsize>, usize)>) -> (StatusCode, &'static str) {
    let n = hits.fetch_add(1, Ordering::SeqCst);
    if n < fail_first {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    } else {
        (StatusCode::OK, EXPOSITION)
    }
}

struct LaunchedGuard;

#[async_trait]
impl DependencyGuard for LaunchedGuard {
    async fn ensure_running(&self) -> Result<bool> {
        Ok(true)
    }

    fn settle(&self) -> Duration {
        Duration::ZERO
    }
}

#[tokio::test]
async fn retries_once_after_cold_start() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/metrics", get(flaky))
        .with_state((Arc::clone(&hits), 1));
    let addr = serve_router(app).await;

    let c = client(addr, "/metrics", Duration::from_secs(5));
    let lines = fetch_with_guard(&c, &LaunchedGuard).await.unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retry_happens_only_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/metrics", get(flaky))
        .with_state((Arc::clone(&hits), 5));
    let addr = serve_router(app).await;

    let c = client(addr, "/metrics", Duration::from_secs(5));
    let err = fetch_with_guard(&c, &LaunchedGuard).await.unwrap_err();
    assert!(err.to_string().contains("503"), "{err}");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn no_retry_when_nothing_was_launched() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/metrics", get(flaky))
        .with_state((Arc::clone(&hits), 1));
    let addr = serve_router(app).await;

    let c = client(addr, "/metrics", Duration::from_secs(5));
    assert!(fetch_with_guard(&c, &NoopGuard).await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
