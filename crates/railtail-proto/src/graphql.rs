//! GraphQL request and response envelopes.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// A GraphQL operation posted to the query API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GraphQlRequest {
    /// Operation document.
    pub query: String,
    /// Operation variables.
    pub variables: serde_json::Value,
}

impl GraphQlRequest {
    /// Create a request.
    #[must_use]
    pub fn new(query: impl Into<String>, variables: serde_json::Value) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GraphQlError {
    /// Human-readable message.
    pub message: String,
}

/// A GraphQL execution result. Also the payload of a `next` frame.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphQlResponse<T> {
    /// Result data.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    /// Errors reported by the server.
    #[serde(default = "Vec::new")]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    /// Joined error messages, if the server reported any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Take the data, treating any reported error or missing data as failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::GraphQl`] when errors were reported and
    /// [`ProtoError::MissingField`] when `data` is absent.
    pub fn into_data(self) -> Result<T, ProtoError> {
        if let Some(message) = self.error_message() {
            return Err(ProtoError::GraphQl(message));
        }
        self.data.ok_or(ProtoError::MissingField("data"))
    }
}
