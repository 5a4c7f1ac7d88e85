// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared in-process document store

use crate::collections::{Collections, Mutation, Outcome};
use crate::query::{Filter, Query};
use crate::{Document, DocumentStore, StoreError, StoreOp};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// In-process document store
///
/// Clones share the same collections, like several handles to one database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Collections>>,
    failures: Arc<Mutex<Vec<StoreOp>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `StoreError::Injected`
    #[cfg(any(test, feature = "test-support"))]
    pub fn fail_next(&self, op: StoreOp) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(op);
    }

    fn injected(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        match failures.iter().position(|f| *f == op) {
            Some(i) => {
                failures.remove(i);
                Err(StoreError::Injected(op))
            }
            None => Ok(()),
        }
    }

    fn mutate(&self, op: StoreOp, mutation: Mutation) -> Result<Outcome, StoreError> {
        self.injected(op)?;
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(mutation)
    }

    fn read<T>(&self, op: StoreOp, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        self.injected(op)?;
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(&state))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn increment(&self, collection: &str, key: &str) -> Result<u64, StoreError> {
        let outcome = self.mutate(
            StoreOp::Increment,
            Mutation::Increment {
                collection: collection.to_string(),
                key: key.to_string(),
            },
        )?;
        outcome.counter()
    }

    async fn ensure_unique_index(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> Result<(), StoreError> {
        self.mutate(
            StoreOp::EnsureUniqueIndex,
            Mutation::EnsureUniqueIndex {
                collection: collection.to_string(),
                fields: fields.iter().map(|f| f.to_string()).collect(),
            },
        )?;
        Ok(())
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.mutate(
            StoreOp::Insert,
            Mutation::Insert {
                collection: collection.to_string(),
                document,
            },
        )?;
        Ok(())
    }

    async fn scan(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.read(StoreOp::Scan, |state| state.scan(collection, query))
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        self.read(StoreOp::FindOne, |state| {
            state.find_one(collection, field, value)
        })
    }

    async fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<u64, StoreError> {
        self.read(StoreOp::Count, |state| state.count(collection, filter))
    }

    async fn replace(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        document: Document,
    ) -> Result<(), StoreError> {
        self.mutate(
            StoreOp::Replace,
            Mutation::Replace {
                collection: collection.to_string(),
                field: field.to_string(),
                value: value.clone(),
                document,
            },
        )?;
        Ok(())
    }

    async fn delete(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, StoreError> {
        let outcome = self.mutate(
            StoreOp::Delete,
            Mutation::Delete {
                collection: collection.to_string(),
                field: field.to_string(),
                value: value.clone(),
            },
        )?;
        Ok(outcome == Outcome::Deleted(true))
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.read(StoreOp::ListCollections, Collections::names)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
