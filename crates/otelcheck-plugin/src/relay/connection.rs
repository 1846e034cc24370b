//! Per-connection relay loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use otelcheck_core::error::{CheckError, Result};

use crate::relay::server::RelayCounters;
use crate::relay::sink::OutputSink;

pub(crate) struct ConnectionHandler {
    pub(crate) peer: SocketAddr,
    pub(crate) sink: OutputSink,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) counters: Arc<RelayCounters>,
}

impl ConnectionHandler {
    /// Serve one client to completion. Errors end this connection only.
    pub(crate) async fn run(self, stream: TcpStream) {
        let peer = self.peer;
        let counters = Arc::clone(&self.counters);
        match self.relay(stream).await {
            Ok(lines) => tracing::debug!(%peer, lines, "relay connection closed"),
            Err(e) => {
                counters.connection_failed();
                tracing::debug!(%peer, error = %e, kind = e.kind().as_str(), "relay connection error");
            }
        }
    }

    async fn relay(self, stream: TcpStream) -> Result<u64> {
        let (rd, mut wr) = stream.into_split();
        let mut reader = BufReader::new(rd);
        let mut buf = String::new();
        let mut relayed = 0u64;

        loop {
            buf.clear();
            if read_line(&mut reader, &mut buf, self.idle_timeout).await? == 0 {
                break;
            }

            let line = trim_newline(&buf);
            if line.is_empty() {
                break;
            }

            self.sink.send(line.to_string()).await?;

            let mut echo = String::with_capacity(line.len() + 1);
            echo.push_str(line);
            echo.push('\n');
            wr.write_all(echo.as_bytes()).await?;

            self.counters.line_relayed();
            relayed += 1;
        }

        // peer may already be gone; the socket closes on drop either way
        let _ = wr.shutdown().await;
        Ok(relayed)
    }
}

/// Streaming read, so line length is bounded only by memory.
async fn read_line<R>(reader: &mut R, buf: &mut String, idle: Option<Duration>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    match idle {
        Some(limit) => tokio::time::timeout(limit, reader.read_line(buf))
            .await
            .map_err(|_| CheckError::Connection(format!("idle for {}ms", limit.as_millis())))?
            .map_err(CheckError::from),
        None => reader.read_line(buf).await.map_err(CheckError::from),
    }
}

fn trim_newline(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}
