// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Backing document database for fact stores and materialized views
//!
//! The engine only talks to [`DocumentStore`]. Two stores ship here:
//! - `MemoryStore` - shared in-process store
//! - `JournalStore` - durable store replayed from an append-only journal

mod collections;
mod journal;
mod memory;
mod query;
mod traced;

pub use collections::{Collections, Mutation, Outcome};
pub use journal::JournalStore;
pub use memory::MemoryStore;
pub use query::{Filter, Query};
pub use traced::TracedStore;

pub use factstreams_core::Document;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Kind of store operation, used in errors and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Increment,
    EnsureUniqueIndex,
    Insert,
    Scan,
    FindOne,
    Count,
    Replace,
    Delete,
    ListCollections,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::Increment => "increment",
            StoreOp::EnsureUniqueIndex => "ensure_unique_index",
            StoreOp::Insert => "insert",
            StoreOp::Scan => "scan",
            StoreOp::FindOne => "find_one",
            StoreOp::Count => "count",
            StoreOp::Replace => "replace",
            StoreOp::Delete => "delete",
            StoreOp::ListCollections => "list_collections",
        };
        f.write_str(name)
    }
}

/// Errors from the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key in {collection}: {key}")]
    DuplicateKey { collection: String, key: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt journal at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
    #[error("injected {0} failure")]
    Injected(StoreOp),
    #[error("{op} returned {outcome:?}")]
    UnexpectedOutcome { op: StoreOp, outcome: Outcome },
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

/// Document database operations required by fact stores and views
///
/// No multi-document transactions are required; every method is atomic on
/// its own.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Atomically increment the counter `key` and return the new value.
    /// Missing counters start at 0, so the first call returns 1.
    async fn increment(&self, collection: &str, key: &str) -> Result<u64, StoreError>;

    /// Declare a compound uniqueness constraint (idempotent)
    async fn ensure_unique_index(&self, collection: &str, fields: &[&str])
        -> Result<(), StoreError>;

    /// Insert a document, failing with `DuplicateKey` on a constraint violation
    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Filtered, sorted, paged scan
    async fn scan(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// First document whose `field` equals `value`
    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Number of documents matching the filter
    async fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<u64, StoreError>;

    /// Replace the document keyed by `field == value`, inserting it if absent
    async fn replace(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        document: Document,
    ) -> Result<(), StoreError>;

    /// Delete the document keyed by `field == value`; returns whether one existed
    async fn delete(&self, collection: &str, field: &str, value: &Value)
        -> Result<bool, StoreError>;

    /// Names of all collections, sorted
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;
}
