// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazy, forward-only reads over the fact log
//!
//! A cursor pages through the fact collection `batch_size` documents at a
//! time. It holds no snapshot: facts appended while it is open may show up
//! in later pages. Every `find`/`find_all` call starts a fresh read.

use crate::error::FactStoreError;
use crate::Database;
use factstreams_core::document::{self, fields};
use factstreams_core::{Document, Fact, FactData, FactMetadata, StreamId};
use factstreams_storage::{Filter, Query};
use std::collections::VecDeque;
use std::marker::PhantomData;

/// Read access to one fact collection
pub struct FactReader<D, M> {
    db: Database,
    collection: String,
    batch_size: usize,
    _facts: PhantomData<fn() -> (D, M)>,
}

impl<D, M> Clone for FactReader<D, M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            collection: self.collection.clone(),
            batch_size: self.batch_size,
            _facts: PhantomData,
        }
    }
}

impl<D: FactData, M: FactMetadata> FactReader<D, M> {
    pub fn new(db: Database, collection: impl Into<String>, batch_size: usize) -> Self {
        Self {
            db,
            collection: collection.into(),
            batch_size: batch_size.max(1),
            _facts: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Facts of one stream, ascending by sequence
    pub fn find(&self, stream_id: StreamId) -> FactCursor<D, M> {
        let query = Query::matching(Filter::eq(fields::STREAM_ID, stream_id.0))
            .sorted_by(fields::SEQUENCE);
        FactCursor::new(self.clone(), query)
    }

    /// Facts of every stream, in persistence order
    pub fn find_all(&self) -> FactCursor<D, M> {
        FactCursor::new(self.clone(), Query::all())
    }
}

/// Forward-only cursor over persisted facts
pub struct FactCursor<D, M> {
    reader: FactReader<D, M>,
    query: Query,
    buffer: VecDeque<Document>,
    offset: usize,
    exhausted: bool,
}

impl<D: FactData, M: FactMetadata> FactCursor<D, M> {
    fn new(reader: FactReader<D, M>, query: Query) -> Self {
        Self {
            reader,
            query,
            buffer: VecDeque::new(),
            offset: 0,
            exhausted: false,
        }
    }

    /// The next fact, or `None` once the log is exhausted
    pub async fn next(&mut self) -> Option<Result<Fact<D, M>, FactStoreError>> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page().await {
                self.exhausted = true;
                return Some(Err(e));
            }
        }

        let doc = self.buffer.pop_front()?;
        Some(document::decode(doc).map_err(FactStoreError::from))
    }

    /// Drain the cursor into a vector
    pub async fn try_collect(mut self) -> Result<Vec<Fact<D, M>>, FactStoreError> {
        let mut facts = Vec::new();
        while let Some(fact) = self.next().await {
            facts.push(fact?);
        }
        Ok(facts)
    }

    async fn fetch_page(&mut self) -> Result<(), FactStoreError> {
        let batch_size = self.reader.batch_size;
        let query = self.query.clone().skip(self.offset).limit(batch_size);
        let page = self
            .reader
            .db
            .scan(&self.reader.collection, &query)
            .await?;

        tracing::trace!(
            collection = %self.reader.collection,
            offset = self.offset,
            fetched = page.len(),
            "fetched page"
        );

        self.offset += page.len();
        if page.len() < batch_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
