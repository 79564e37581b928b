//! Stream supervisor.
//!
//! Owns the subscription connection for the lifetime of a run. Each physical
//! connection is one epoch with its own [`Watermark`]. A fault closes the
//! connection and resubscribes immediately; only failed connection attempts
//! back off. The loop ends on cancellation or when the sink is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use railtail_logs::{reconstruct_batch, Enricher, LogRecord, SharedMetadata, Watermark};
use railtail_proto::{ClientMessage, FrameKind, GraphQlResponse, ServerFrame};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::SubscriptionConnection;
use super::reconnect::ReconnectConfig;
use super::state::{AtomicSupervisorState, SupervisorState};
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::sink::LogSink;

/// `data` of a `next` frame.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentLogs {
    #[serde(default)]
    environment_logs: Vec<LogRecord>,
}

/// How an epoch ended.
#[derive(Debug)]
enum EpochOutcome {
    Cancelled,
    SinkClosed,
    Completed,
    Faulted(String),
}

/// Keeps one logical subscription alive across connection faults.
#[derive(Debug)]
pub struct StreamSupervisor {
    config: StreamConfig,
    metadata: SharedMetadata,
    reconnect: ReconnectConfig,
    state: AtomicSupervisorState,
    epoch: AtomicU64,
    reconnects: AtomicU64,
}

impl StreamSupervisor {
    /// Create a supervisor; backoff settings come from `config`.
    #[must_use]
    pub fn new(config: StreamConfig, metadata: SharedMetadata) -> Self {
        let reconnect = config.reconnect_config();
        Self {
            config,
            metadata,
            reconnect,
            state: AtomicSupervisorState::new(SupervisorState::Idle),
            epoch: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        self.state.load()
    }

    /// Number of epochs started. An epoch begins at a successful handshake,
    /// so failed connection attempts are not counted.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Number of reconnects after a fault, completion or failed attempt.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    /// Drive the subscription until `cancel` fires or the sink is dropped.
    ///
    /// Handshake and connection failures are absorbed.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::SinkClosed`] if the receiver was dropped.
    pub async fn run(&self, sink: LogSink, cancel: CancellationToken) -> Result<(), StreamError> {
        let mut failed_attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                self.stop("cancelled");
                return Ok(());
            }

            self.state.store(SupervisorState::Connecting);
            debug!(reconnects = self.reconnects(), "connecting");

            let subscription = self.config.subscription_config(Utc::now());
            let opened = tokio::select! {
                () = cancel.cancelled() => {
                    self.stop("cancelled");
                    return Ok(());
                }
                opened = SubscriptionConnection::open(
                    &self.config.subscription_url,
                    &self.config.api_key,
                    &subscription,
                    self.config.connect_timeout(),
                ) => opened,
            };

            let mut connection = match opened {
                Ok(connection) => {
                    failed_attempts = 0;
                    connection
                }
                Err(e) => {
                    failed_attempts = failed_attempts.saturating_add(1);
                    self.state.store(SupervisorState::Faulted);
                    warn!(attempt = failed_attempts, error = %e, "failed to establish subscription");

                    if !self.reconnect.wait(failed_attempts, &cancel).await {
                        self.stop("cancelled");
                        return Ok(());
                    }
                    self.reconnects.fetch_add(1, Ordering::SeqCst);
                    continue;
                }
            };

            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            self.state.store(SupervisorState::Streaming);
            info!(epoch, operation_id = connection.operation_id(), "streaming");

            let outcome = self.stream_epoch(&mut connection, &sink, &cancel, epoch).await;

            if let Err(e) = connection.close().await {
                debug!(epoch, error = %e, "error closing connection");
            }

            match outcome {
                EpochOutcome::Cancelled => {
                    self.stop("cancelled");
                    return Ok(());
                }
                EpochOutcome::SinkClosed => {
                    self.stop("sink closed");
                    return Err(StreamError::SinkClosed);
                }
                EpochOutcome::Completed => {
                    info!(epoch, "subscription completed by server, resubscribing");
                }
                EpochOutcome::Faulted(reason) => {
                    self.state.store(SupervisorState::Faulted);
                    warn!(epoch, %reason, "subscription faulted, resubscribing");
                }
            }
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn stream_epoch(
        &self,
        connection: &mut SubscriptionConnection,
        sink: &LogSink,
        cancel: &CancellationToken,
        epoch: u64,
    ) -> EpochOutcome {
        let mut watermark = Watermark::new();
        // names are fixed for the epoch; a refresh applies from the next one
        let enricher = Enricher::new(self.metadata.load());

        loop {
            let frame = tokio::select! {
                () = cancel.cancelled() => return EpochOutcome::Cancelled,
                frame = connection.next_frame() => frame,
            };

            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => return EpochOutcome::Faulted(e.to_string()),
            };

            match frame.kind() {
                FrameKind::Next => {}
                FrameKind::Ping => {
                    if let Err(e) = connection.send(&ClientMessage::Pong).await {
                        return EpochOutcome::Faulted(e.to_string());
                    }
                    continue;
                }
                FrameKind::Pong => continue,
                FrameKind::Complete => return EpochOutcome::Completed,
                FrameKind::Error => {
                    return EpochOutcome::Faulted(format!(
                        "subscription error: {}",
                        frame.payload.unwrap_or_default()
                    ));
                }
                FrameKind::ConnectionAck | FrameKind::Unknown => {
                    return EpochOutcome::Faulted(format!(
                        "unexpected frame type '{}'",
                        frame.frame_type
                    ));
                }
            }

            let records = match decode_records(frame) {
                Ok(records) => records,
                Err(reason) => return EpochOutcome::Faulted(reason),
            };
            let received = records.len();

            let mut fresh = watermark.retain_fresh(records);
            if fresh.is_empty() {
                debug!(epoch, received, "no fresh records in batch");
                continue;
            }

            enricher.enrich_all(&mut fresh);
            let batch = reconstruct_batch(&fresh);
            if batch.is_empty() {
                continue;
            }
            debug!(epoch, received, records = batch.len(), dropped = batch.dropped, "emitting batch");

            tokio::select! {
                () = cancel.cancelled() => return EpochOutcome::Cancelled,
                sent = sink.send(batch) => {
                    if sent.is_err() {
                        return EpochOutcome::SinkClosed;
                    }
                }
            }
        }
    }

    fn stop(&self, reason: &str) {
        self.state.store(SupervisorState::Stopped);
        info!(epoch = self.epoch(), reconnects = self.reconnects(), reason, "supervisor stopped");
    }
}

fn decode_records(frame: ServerFrame) -> Result<Vec<LogRecord>, String> {
    let response: GraphQlResponse<EnvironmentLogs> =
        frame.into_payload().map_err(|e| format!("malformed next payload: {e}"))?;

    let errors = response.error_message();
    match (response.data, errors) {
        (Some(data), Some(errors)) => {
            warn!(%errors, "next payload carried errors alongside data");
            Ok(data.environment_logs)
        }
        (Some(data), None) => Ok(data.environment_logs),
        (None, Some(errors)) => Err(format!("subscription returned errors: {errors}")),
        (None, None) => Err("next payload without data".to_string()),
    }
}
