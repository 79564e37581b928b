//! Core types for streamed log records.
//!
//! This module provides:
//! - [`LogRecord`]: one record as delivered by the provider
//! - [`LogTags`]: identifier tags and their resolved display names
//! - [`Attribute`]: a dynamic key with a raw JSON value
//! - [`LogBatch`]: reconstructed documents handed to the sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One log record from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the record was produced, nanosecond precision.
    pub timestamp: DateTime<Utc>,
    /// The log message.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Provider-defined severity, possibly empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub severity: String,
    /// Identifier tags.
    #[serde(default)]
    pub tags: LogTags,
    /// Dynamic attributes in delivery order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Identifier tags of a record and the names resolved for them.
///
/// Ids come from the provider; names are filled in by the
/// [`Enricher`](crate::Enricher).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTags {
    /// Project id.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Project display name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub project_name: String,
    /// Environment id.
    #[serde(default)]
    pub environment_id: Option<String>,
    /// Environment display name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment_name: String,
    /// Service id.
    #[serde(default)]
    pub service_id: Option<String>,
    /// Service display name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_name: String,
    /// Deployment id.
    #[serde(default)]
    pub deployment_id: Option<String>,
    /// Deployment instance id.
    #[serde(default)]
    pub deployment_instance_id: Option<String>,
}

/// A dynamic attribute. `value` holds pre-serialized JSON text and is only
/// parsed when the record is reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key, kept verbatim.
    pub key: String,
    /// Raw JSON value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reconstructed documents of one accepted batch, in acceptance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogBatch {
    /// One JSON object per emitted record.
    pub documents: Vec<serde_json::Value>,
    /// Records dropped because they could not be reconstructed.
    pub dropped: usize,
}

impl LogBatch {
    /// Number of documents in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the batch has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Render the batch as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.documents)?)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
