//! Id → display-name lookup used for enrichment.
//!
//! A [`MetadataTable`] is immutable once built. [`SharedMetadata`] holds the
//! current table behind an `Arc` so a refresh swaps the whole table and
//! readers keep the snapshot they already loaded.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Mapping from opaque id to display name, covering projects, environments
/// and services in one keyspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    names: HashMap<String, String>,
}

impl MetadataTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the display name for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Number of ids in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over `(id, name)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(id, name)| (id.into(), name.into()))
                .collect(),
        }
    }
}

/// Shareable handle to the current [`MetadataTable`].
#[derive(Debug, Clone, Default)]
pub struct SharedMetadata {
    current: Arc<RwLock<Arc<MetadataTable>>>,
}

impl SharedMetadata {
    /// Wrap a table.
    #[must_use]
    pub fn new(table: MetadataTable) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// Snapshot of the current table.
    #[must_use]
    pub fn load(&self) -> Arc<MetadataTable> {
        Arc::clone(&*self.current.read())
    }

    /// Replace the table, returning the previous one.
    pub fn replace(&self, table: MetadataTable) -> Arc<MetadataTable> {
        std::mem::replace(&mut *self.current.write(), Arc::new(table))
    }
}
