//! railtail - resilient log stream subscriber
//!
//! Subscribes to a provider's live environment log feed, keeps the
//! subscription alive across faults, filters stale records, enriches them
//! with resolved names and hands reconstructed JSON documents to a sink.
//!
//! ```no_run
//! use railtail::{log_channel, LogPipeline, StreamConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), railtail::StreamError> {
//! let config = StreamConfig::new("api-key", "environment-id");
//! let pipeline = LogPipeline::new(config)?;
//! let (sink, mut batches) = log_channel(64);
//!
//! tokio::spawn(async move {
//!     while let Some(batch) = batches.recv().await {
//!         println!("{}", batch.len());
//!     }
//! });
//!
//! pipeline.run(sink, CancellationToken::new()).await
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod graphql;
pub mod metadata;
pub mod pipeline;
pub mod sink;
pub mod subscription;

pub use config::StreamConfig;
pub use error::StreamError;
pub use graphql::GraphQlClient;
pub use metadata::MetadataResolver;
pub use pipeline::LogPipeline;
pub use sink::{log_channel, write_batches, LogSink};
pub use subscription::{
    ReconnectConfig, StreamSupervisor, SubscriptionConfig, SubscriptionConnection,
    SupervisorState,
};
