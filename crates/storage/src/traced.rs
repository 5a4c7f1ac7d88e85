// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::query::{Filter, Query};
use crate::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any DocumentStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn finish<T>(start: Instant, result: &Result<T, StoreError>) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(_) => tracing::trace!(elapsed_ms, "done"),
        // Duplicate keys are an expected outcome of racing appends
        Err(e) if e.is_duplicate_key() => tracing::warn!(elapsed_ms, error = %e, "rejected"),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TracedStore<S> {
    async fn increment(&self, collection: &str, key: &str) -> Result<u64, StoreError> {
        let span = tracing::debug_span!("store.increment", collection, key);
        async {
            let start = Instant::now();
            let result = self.inner.increment(collection, key).await;
            if let Ok(value) = &result {
                tracing::debug!(value, "incremented");
            }
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn ensure_unique_index(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.ensure_unique_index", collection, fields = ?fields);
        async {
            let start = Instant::now();
            let result = self.inner.ensure_unique_index(collection, fields).await;
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let span = tracing::debug_span!("store.insert", collection);
        async {
            tracing::trace!(fields = document.len(), "inserting");
            let start = Instant::now();
            let result = self.inner.insert(collection, document).await;
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn scan(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let span = tracing::debug_span!(
            "store.scan",
            collection,
            skip = query.skip,
            limit = ?query.limit
        );
        async {
            let start = Instant::now();
            let result = self.inner.scan(collection, query).await;
            tracing::trace!(count = result.as_ref().map(|d| d.len()).ok(), "scanned");
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let span = tracing::trace_span!("store.find_one", collection, field, %value);
        async {
            let start = Instant::now();
            let result = self.inner.find_one(collection, field, value).await;
            tracing::trace!(found = result.as_ref().map(Option::is_some).ok(), "looked up");
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<u64, StoreError> {
        let span = tracing::trace_span!("store.count", collection);
        async {
            let start = Instant::now();
            let result = self.inner.count(collection, filter).await;
            tracing::trace!(count = result.as_ref().ok(), "counted");
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn replace(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        document: Document,
    ) -> Result<(), StoreError> {
        let span = tracing::debug_span!("store.replace", collection, field, %value);
        async {
            let start = Instant::now();
            let result = self.inner.replace(collection, field, value, document).await;
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn delete(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.delete", collection, field, %value);
        async {
            let start = Instant::now();
            let result = self.inner.delete(collection, field, value).await;
            if let Ok(existed) = &result {
                tracing::debug!(existed, "deleted");
            }
            finish(start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let result = self.inner.list_collections().await;
        tracing::trace!(count = result.as_ref().map(|c| c.len()).ok(), "listed collections");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
