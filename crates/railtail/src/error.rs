//! Error types for railtail.

use thiserror::Error;

/// Errors that can occur while streaming logs.
///
/// Only [`Config`](Self::Config) and [`MetadataFetch`](Self::MetadataFetch)
/// end the pipeline; the rest drive reconnects or are absorbed.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Resolving the metadata table failed.
    #[error("metadata fetch failed: {0}")]
    MetadataFetch(String),

    /// Establishing the subscription failed.
    #[error("subscription handshake failed: {0}")]
    Handshake(String),

    /// The established connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The sink receiver was dropped.
    #[error("log sink closed")]
    SinkClosed,

    /// Protocol encoding or decoding error.
    #[error("protocol error: {0}")]
    Protocol(#[from] railtail_proto::ProtoError),

    /// A batch could not be rendered.
    #[error("log error: {0}")]
    Log(#[from] railtail_logs::LogError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Whether this error terminates the pipeline.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::MetadataFetch(_))
    }
}
