//! Bounded handoff of reconstructed batches to the consumer.

use railtail_logs::LogBatch;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::StreamError;

/// Create a sink and the receiver that drains it.
///
/// `send` waits once `capacity` batches are queued, so a slow consumer
/// throttles the read loop.
#[must_use]
pub fn log_channel(capacity: usize) -> (LogSink, mpsc::Receiver<LogBatch>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (LogSink { tx }, rx)
}

/// Sending half of the batch channel.
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::Sender<LogBatch>,
}

impl LogSink {
    /// Hand over one batch, waiting for capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::SinkClosed`] if the receiver was dropped.
    pub async fn send(&self, batch: LogBatch) -> Result<(), StreamError> {
        self.tx.send(batch).await.map_err(|_| StreamError::SinkClosed)
    }
}

/// Write every received batch to `writer` as one JSON array per line, until
/// all senders are dropped. Returns the number of documents written.
///
/// # Errors
///
/// Returns an error if a batch cannot be rendered or the write fails.
pub async fn write_batches<W>(
    rx: &mut mpsc::Receiver<LogBatch>,
    mut writer: W,
) -> Result<usize, StreamError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while let Some(batch) = rx.recv().await {
        let mut line = batch.to_json()?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;

        written += batch.len();
        debug!(records = batch.len(), dropped = batch.dropped, "batch written");
    }

    Ok(written)
}
