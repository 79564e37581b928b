//! End-to-end pipeline: resolve metadata once, then supervise the stream.

use std::sync::Arc;

use railtail_logs::{MetadataTable, SharedMetadata};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::metadata::MetadataResolver;
use crate::sink::LogSink;
use crate::subscription::StreamSupervisor;

/// Wires the metadata resolver and the stream supervisor together.
#[derive(Debug)]
pub struct LogPipeline {
    resolver: MetadataResolver,
    metadata: SharedMetadata,
    supervisor: Arc<StreamSupervisor>,
    environment_id: String,
}

impl LogPipeline {
    /// Validate `config` and build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Config`] if the configuration is invalid.
    pub fn new(config: StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;

        let resolver = MetadataResolver::from_config(&config)?;
        let metadata = SharedMetadata::default();
        let environment_id = config.environment_id.clone();
        let supervisor = Arc::new(StreamSupervisor::new(config, metadata.clone()));

        Ok(Self {
            resolver,
            metadata,
            supervisor,
            environment_id,
        })
    }

    /// Supervisor handle, for observing state and counters.
    #[must_use]
    pub fn supervisor(&self) -> Arc<StreamSupervisor> {
        Arc::clone(&self.supervisor)
    }

    /// Metadata shared with the supervisor.
    #[must_use]
    pub fn metadata(&self) -> &SharedMetadata {
        &self.metadata
    }

    /// Fetch the metadata table and install it for enrichment.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::MetadataFetch`] if resolution fails.
    pub async fn refresh_metadata(&self) -> Result<Arc<MetadataTable>, StreamError> {
        let table = self.resolver.resolve(&self.environment_id).await?;
        self.metadata.replace(table);
        Ok(self.metadata.load())
    }

    /// Resolve metadata, then stream until `cancel` fires or the sink's
    /// receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::MetadataFetch`] if metadata cannot be resolved;
    /// everything after that is absorbed.
    pub async fn run(&self, sink: LogSink, cancel: CancellationToken) -> Result<(), StreamError> {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("cancelled before metadata resolved");
                return Ok(());
            }
            resolved = self.refresh_metadata() => { resolved?; }
        }

        match self.supervisor.run(sink, cancel).await {
            Err(StreamError::SinkClosed) => {
                info!("log sink closed, stream finished");
                Ok(())
            }
            other => other,
        }
    }
}
