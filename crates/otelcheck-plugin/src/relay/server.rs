//! Relay accept loop with a bounded overall lifetime.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::Instant;

use otelcheck_core::error::{CheckError, Result};

use crate::relay::connection::ConnectionHandler;
use crate::relay::sink::OutputSink;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 2003;

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);
/// Stand-in deadline for lifetimes too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Delay before the next `accept` after `failures` consecutive accept errors.
pub(crate) fn accept_backoff(failures: u32) -> Duration {
    let exp = failures.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(1 << exp)
        .min(ACCEPT_BACKOFF_MAX)
}

/// Why the accept loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    Lifetime,
    Requested,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Wall-clock budget for accepting connections, measured from `serve`.
    pub lifetime: Duration,
    pub idle_timeout: Option<Duration>,
}

impl RelayConfig {
    pub fn new(host: impl Into<String>, port: u16, lifetime: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            lifetime,
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle: Option<Duration>) -> Self {
        self.idle_timeout = idle;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Default)]
pub(crate) struct RelayCounters {
    connections: AtomicU64,
    lines: AtomicU64,
    failed: AtomicU64,
}

impl RelayCounters {
    fn connection_opened(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn line_relayed(&self) {
        self.lines.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RelayStats {
        RelayStats {
            connections: self.connections.load(Ordering::Relaxed),
            lines: self.lines.load(Ordering::Relaxed),
            failed_connections: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Totals for one relay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub connections: u64,
    pub lines: u64,
    pub failed_connections: u64,
}

pub struct RelayServer {
    listener: TcpListener,
    cfg: RelayConfig,
    sink: OutputSink,
    counters: Arc<RelayCounters>,
}

impl RelayServer {
    /// Bind the listening socket. Fails with `CheckError::Bind` when the
    /// address is invalid or already in use.
    pub async fn bind(cfg: RelayConfig, sink: OutputSink) -> Result<Self> {
        let listener = TcpListener::bind((cfg.host.as_str(), cfg.port))
            .await
            .map_err(|source| CheckError::Bind {
                address: cfg.bind_address(),
                source,
            })?;

        Ok(Self {
            listener,
            cfg,
            sink,
            counters: Arc::new(RelayCounters::default()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|source| CheckError::Bind {
            address: self.cfg.bind_address(),
            source,
        })
    }

    /// Accept connections until the lifetime elapses or `shutdown` resolves.
    ///
    /// The listener is closed on return. Connections accepted before that
    /// keep running in the returned handle.
    pub async fn serve<F>(self, shutdown: F) -> RelayHandle
    where
        F: Future<Output = ()>,
    {
        let RelayServer {
            listener,
            cfg,
            sink,
            counters,
        } = self;

        let now = Instant::now();
        let deadline_at = now
            .checked_add(cfg.lifetime)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let deadline = tokio::time::sleep_until(deadline_at);
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut tasks = JoinSet::new();
        let mut accept_failures = 0u32;

        tracing::info!(
            address = %cfg.bind_address(),
            lifetime = ?cfg.lifetime,
            "metric relay listening"
        );

        let cause = loop {
            tokio::select! {
                _ = &mut deadline => {
                    tracing::info!("metric relay lifetime elapsed");
                    break StopCause::Lifetime;
                }
                _ = &mut shutdown => {
                    tracing::info!("metric relay stop requested");
                    break StopCause::Requested;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!(error = %e, "relay connection task aborted");
                    }
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            accept_failures = 0;
                            counters.connection_opened();
                            tracing::debug!(%peer, "relay connection accepted");

                            let handler = ConnectionHandler {
                                peer,
                                sink: sink.clone(),
                                idle_timeout: cfg.idle_timeout,
                                counters: Arc::clone(&counters),
                            };
                            tasks.spawn(handler.run(stream));
                        }
                        Err(e) => {
                            accept_failures = accept_failures.saturating_add(1);
                            let backoff = accept_backoff(accept_failures);
                            tracing::warn!(error = %e, ?backoff, "relay accept error");
                            tokio::time::sleep(backoff).await;
                        }
                    }
                }
            }
        };

        drop(listener);

        RelayHandle {
            tasks,
            counters,
            cause,
        }
    }
}

/// Connections still being served after the accept loop returned.
pub struct RelayHandle {
    tasks: JoinSet<()>,
    counters: Arc<RelayCounters>,
    cause: StopCause,
}

impl RelayHandle {
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn stop_cause(&self) -> StopCause {
        self.cause
    }

    /// Wait for in-flight connections.
    ///
    /// After the lifetime elapsed this waits for every connection to end on
    /// its own. After an explicit stop open connections are aborted.
    pub async fn drain(self) -> RelayStats {
        self.drain_until(std::future::pending()).await
    }

    /// Like [`drain`](Self::drain), but aborts whatever is still open once
    /// `stop` resolves.
    pub async fn drain_until<F>(mut self, stop: F) -> RelayStats
    where
        F: Future<Output = ()>,
    {
        if self.tasks.is_empty() {
            return self.counters.snapshot();
        }

        if self.cause == StopCause::Requested {
            tracing::info!(in_flight = self.tasks.len(), "closing relay connections");
            self.tasks.abort_all();
        } else {
            tracing::info!(in_flight = self.tasks.len(), "waiting for relay connections");
        }

        tokio::pin!(stop);
        let mut stopped = self.cause == StopCause::Requested;

        loop {
            tokio::select! {
                joined = self.tasks.join_next() => match joined {
                    None => break,
                    Some(Err(e)) if !e.is_cancelled() => {
                        tracing::warn!(error = %e, "relay connection task aborted");
                    }
                    Some(_) => {}
                },
                _ = &mut stop, if !stopped => {
                    stopped = true;
                    tracing::info!(in_flight = self.tasks.len(), "closing relay connections");
                    self.tasks.abort_all();
                }
            }
        }

        self.counters.snapshot()
    }
}
