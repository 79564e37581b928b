//! Metadata resolution: one environment query and one project query build
//! the id → name table used for enrichment.

use railtail_logs::MetadataTable;
use railtail_proto::queries::{ENVIRONMENT, PROJECT};
use railtail_proto::{EnvironmentData, ProjectData};
use serde_json::json;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::graphql::GraphQlClient;

/// Fetches project, environment and service names.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    client: GraphQlClient,
}

impl MetadataResolver {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: GraphQlClient) -> Self {
        Self { client }
    }

    /// Build a resolver from stream configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Config`] if the client cannot be built.
    pub fn from_config(config: &StreamConfig) -> Result<Self, StreamError> {
        let client = GraphQlClient::new(
            config.api_url.clone(),
            &config.api_key,
            config.request_timeout(),
        )?;
        Ok(Self::new(client))
    }

    /// Resolve names for the project owning `environment_id`, its
    /// environments and its services.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::MetadataFetch`] if either query fails.
    pub async fn resolve(&self, environment_id: &str) -> Result<MetadataTable, StreamError> {
        let environment: EnvironmentData = self
            .client
            .query(ENVIRONMENT, json!({ "id": environment_id }))
            .await?;
        let project_id = environment.environment.project_id;
        debug!(%environment_id, %project_id, "resolved owning project");

        let project: ProjectData = self
            .client
            .query(PROJECT, json!({ "id": project_id }))
            .await?;
        let project = project.project;

        let table: MetadataTable = std::iter::once((project.id.clone(), project.name.clone()))
            .chain(
                project
                    .services
                    .nodes()
                    .chain(project.environments.nodes())
                    .map(|node| (node.id.clone(), node.name.clone())),
            )
            .collect();

        info!(project = %project.name, entries = table.len(), "metadata resolved");
        Ok(table)
    }
}
