//! Process-wide output sink shared by relay handlers.
//!
//! Handlers never touch stdout directly. They push whole lines into a bounded
//! channel and a single writer drains it, so lines from concurrent
//! connections cannot interleave mid-line.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use otelcheck_core::error::{CheckError, Result};

#[derive(Clone, Debug)]
pub struct OutputSink {
    tx: mpsc::Sender<String>,
}

impl OutputSink {
    /// Sink plus the receiving end, for callers that consume lines themselves.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Sink backed by a writer task. The task ends once every sink clone is
    /// dropped and returns the number of lines written.
    pub fn spawn_writer<W>(capacity: usize, writer: W) -> (Self, JoinHandle<std::io::Result<u64>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, rx) = Self::channel(capacity);
        let task = tokio::spawn(write_lines(rx, writer));
        (sink, task)
    }

    pub async fn send(&self, line: String) -> Result<()> {
        self.tx
            .send(line)
            .await
            .map_err(|_| CheckError::Connection("output sink closed".into()))
    }
}

/// Drain `rx` into `writer`, one `\n`-terminated line per message.
pub async fn write_lines<W>(mut rx: mpsc::Receiver<String>, mut writer: W) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }
    Ok(written)
}
