//! Attach resolved display names to record tags.

use std::sync::Arc;

use tracing::warn;

use crate::metadata::MetadataTable;
use crate::types::LogRecord;

/// Name written into a tag when its id cannot be resolved.
pub const UNDEFINED: &str = "undefined";

/// Fills project, environment and service names from a [`MetadataTable`].
///
/// An unresolved id never drops a record: the name becomes [`UNDEFINED`].
#[derive(Debug, Clone)]
pub struct Enricher {
    table: Arc<MetadataTable>,
}

impl Enricher {
    /// Create an enricher over a table snapshot.
    #[must_use]
    pub fn new(table: Arc<MetadataTable>) -> Self {
        Self { table }
    }

    /// Resolve all tag names of `record` in place.
    pub fn enrich(&self, record: &mut LogRecord) {
        let tags = &mut record.tags;
        tags.service_name = self.resolve("service", tags.service_id.as_deref());
        tags.environment_name = self.resolve("environment", tags.environment_id.as_deref());
        tags.project_name = self.resolve("project", tags.project_id.as_deref());
    }

    /// Resolve every record of a batch.
    pub fn enrich_all(&self, records: &mut [LogRecord]) {
        for record in records {
            self.enrich(record);
        }
    }

    fn resolve(&self, kind: &'static str, id: Option<&str>) -> String {
        match id.and_then(|id| self.table.get(id)) {
            Some(name) => name.to_string(),
            None => {
                warn!(kind, id = id.unwrap_or_default(), "name not found for tag id");
                UNDEFINED.to_string()
            }
        }
    }
}
