// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database handle that fact stores are created from

use crate::error::FactStoreError;
use crate::store::FactStore;
use crate::Database;
use factstreams_core::{FactData, FactMetadata, FactStoreConfig};
use factstreams_storage::{JournalStore, MemoryStore, StoreError, TracedStore};
use std::path::Path;
use std::sync::Arc;

/// An open connection to a backing document store
pub struct FactStreams {
    db: Database,
}

impl FactStreams {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Traced, process-local database
    pub fn in_memory() -> Self {
        Self::new(Arc::new(TracedStore::new(MemoryStore::new())))
    }

    /// Traced database persisted to the journal at `path`
    pub fn open_journal(path: &Path) -> Result<Self, StoreError> {
        let store = JournalStore::open(path)?;
        tracing::info!(path = %path.display(), "opened journal");
        Ok(Self::new(Arc::new(TracedStore::new(store))))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create a fact store over the collections named by `config`
    pub async fn create_fact_store<D, M>(
        &self,
        config: FactStoreConfig,
    ) -> Result<FactStore<D, M>, FactStoreError>
    where
        D: FactData,
        M: FactMetadata,
    {
        FactStore::create(self.db.clone(), config).await
    }

    /// Release this handle
    ///
    /// Stores created from it keep their own reference to the database and
    /// remain usable.
    pub fn close(self) {
        tracing::debug!(handles = Arc::strong_count(&self.db), "closing database handle");
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod tests;
