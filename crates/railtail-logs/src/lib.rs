//! # railtail-logs
//!
//! Log-side processing for records streamed from the provider.
//!
//! This crate provides:
//!
//! - [`LogRecord`]: one deserialized record with its [`LogTags`] and dynamic [`Attribute`]s
//! - [`MetadataTable`] / [`SharedMetadata`]: id → display-name lookup
//! - [`Watermark`]: per-epoch staleness and duplicate filter
//! - [`Enricher`]: fills tag names from the metadata table
//! - [`reconstruct_record`] / [`reconstruct_batch`]: canonical JSON documents
//!
//! ## Example
//!
//! ```rust
//! use railtail_logs::{reconstruct_record, Enricher, LogRecord, MetadataTable};
//!
//! let mut record: LogRecord = serde_json::from_str(
//!     r#"{"timestamp":"2026-01-01T00:00:00Z","message":"ready","severity":"info",
//!         "tags":{"serviceId":"svc-1"},"attributes":[{"key":"port","value":"8080"}]}"#,
//! ).unwrap();
//!
//! let table: MetadataTable = [("svc-1", "api")].into_iter().collect();
//! Enricher::new(table.into()).enrich(&mut record);
//!
//! let document = reconstruct_record(&record).unwrap();
//! assert_eq!(document["_metadata"]["serviceName"], "api");
//! assert_eq!(document["port"], 8080);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod enrich;
pub mod error;
pub mod metadata;
pub mod reconstruct;
pub mod types;
pub mod watermark;

pub use enrich::{Enricher, UNDEFINED};
pub use error::{LogError, Result};
pub use metadata::{MetadataTable, SharedMetadata};
pub use reconstruct::{reconstruct_batch, reconstruct_record};
pub use types::{Attribute, LogBatch, LogRecord, LogTags};
pub use watermark::Watermark;
