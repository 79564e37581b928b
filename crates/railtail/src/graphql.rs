//! Authenticated GraphQL client for the provider's query API.

use std::time::Duration;

use railtail_proto::{GraphQlRequest, GraphQlResponse};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StreamError;

/// Build the `Authorization` header value for `token`.
///
/// # Errors
///
/// Returns [`StreamError::Config`] if the token is empty or not a valid
/// header value.
pub fn bearer(token: &str) -> Result<HeaderValue, StreamError> {
    if token.is_empty() {
        return Err(StreamError::Config("api key must be present".to_string()));
    }

    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| StreamError::Config(format!("api key is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Posts GraphQL operations with a bearer token.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GraphQlClient {
    /// Create a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Config`] for an empty token or if the HTTP
    /// client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, StreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(token)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StreamError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Execute `query` and decode its `data` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::MetadataFetch`] on transport failure, a non
    /// success status, a malformed body, GraphQL errors or missing data.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, StreamError> {
        let request = GraphQlRequest::new(query, variables);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| StreamError::MetadataFetch(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::MetadataFetch(format!(
                "unexpected status {status}: {body}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StreamError::MetadataFetch(format!("failed to read body: {e}")))?;
        debug!(bytes = body.len(), "graphql response received");

        let envelope: GraphQlResponse<T> = serde_json::from_slice(&body)
            .map_err(|e| StreamError::MetadataFetch(format!("malformed response: {e}")))?;

        envelope
            .into_data()
            .map_err(|e| StreamError::MetadataFetch(e.to_string()))
    }
}
