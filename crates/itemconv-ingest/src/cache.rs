//! Process-lifetime memoization of loaded mapping tables.

use std::collections::HashMap;
use std::sync::Arc;

use itemconv_model::OutputSchema;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::fetch::HttpFetch;
use crate::loader::{LoadedMapping, load_mapping, resolve_columns};
use crate::source::{MappingSource, SourceConfig, SourceKey};

/// Loaded mappings keyed by the resolved source locator.
///
/// Entries are immutable and handed out as `Arc`s. Failed loads are never
/// stored, so the next call retries them. A hit requested with a different
/// schema than the stored entry gets its column map resolved again from the
/// cached table; the source is not read twice.
#[derive(Debug, Default)]
pub struct MappingCache {
    entries: HashMap<SourceKey, Arc<LoadedMapping>>,
}

impl MappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached mapping for `source`, loading it on first use.
    pub fn get_or_load(
        &mut self,
        source: &MappingSource,
        fetcher: &dyn HttpFetch,
        schema: &OutputSchema,
    ) -> Result<Arc<LoadedMapping>> {
        let key = source.key();
        if let Some(mapping) = self.entries.get(&key) {
            debug!(source = %key, "mapping cache hit");
            let columns = resolve_columns(&mapping.table, schema);
            if columns == mapping.columns {
                return Ok(Arc::clone(mapping));
            }
            debug!(source = %key, "schema differs from cached entry, resolving columns again");
            return Ok(Arc::new(LoadedMapping {
                columns,
                ..mapping.as_ref().clone()
            }));
        }

        let mapping = Arc::new(load_mapping(source, fetcher, schema)?);
        self.entries.insert(key, Arc::clone(&mapping));
        Ok(mapping)
    }

    /// Load the first available source of `config`.
    ///
    /// Sources that are unavailable are skipped with a warning; parse and
    /// schema failures stop the search. When nothing is available the last
    /// unavailability error is returned.
    pub fn get_or_load_first(
        &mut self,
        config: &SourceConfig,
        fetcher: &dyn HttpFetch,
        schema: &OutputSchema,
    ) -> Result<Arc<LoadedMapping>> {
        let mut last_error = None;
        for source in config.candidates() {
            match self.get_or_load(&source, fetcher, schema) {
                Ok(mapping) => return Ok(mapping),
                Err(error) if error.is_unavailable() => {
                    warn!(source = %source.label(), %error, "mapping source unavailable, trying next");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }
        Err(last_error.unwrap_or(IngestError::NoSourceConfigured))
    }

    pub fn get(&self, key: &SourceKey) -> Option<Arc<LoadedMapping>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop one entry so the next request reloads it.
    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
