//! Log document reconstruction.
//!
//! A record becomes one flat JSON object built by successive insertion:
//! `message`, `_metadata`, one key per attribute, `timestamp`, `severity`.
//! Later insertions replace earlier keys of the same name in place.
//! Numbers keep their wire text (`arbitrary_precision`), so attribute values
//! are not rounded or renormalized.

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{LogError, Result};
use crate::types::{LogBatch, LogRecord};

/// Build the canonical document for one enriched record.
///
/// # Errors
///
/// Returns [`LogError::Reconstruction`] if an attribute value is not valid
/// JSON.
pub fn reconstruct_record(record: &LogRecord) -> Result<Value> {
    let mut document = Map::new();

    document.insert("message".to_string(), Value::String(record.message.clone()));
    document.insert("_metadata".to_string(), serde_json::to_value(&record.tags)?);

    for attribute in &record.attributes {
        let value: Value =
            serde_json::from_str(&attribute.value).map_err(|source| LogError::Reconstruction {
                key: attribute.key.clone(),
                source,
            })?;
        document.insert(attribute.key.clone(), value);
    }

    document.insert(
        "timestamp".to_string(),
        Value::String(
            record
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
    );
    // always present, consumers expect the key even when the provider sent none
    document.insert("severity".to_string(), Value::String(record.severity.clone()));

    Ok(Value::Object(document))
}

/// Reconstruct every record independently. Records that fail are logged and
/// dropped; the rest keep their order.
#[must_use]
pub fn reconstruct_batch(records: &[LogRecord]) -> LogBatch {
    let mut batch = LogBatch {
        documents: Vec::with_capacity(records.len()),
        dropped: 0,
    };

    for record in records {
        match reconstruct_record(record) {
            Ok(document) => batch.documents.push(document),
            Err(e) => {
                warn!(timestamp = %record.timestamp, error = %e, "dropping log record");
                batch.dropped += 1;
            }
        }
    }

    batch
}
