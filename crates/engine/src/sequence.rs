// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream identifiers and per-stream sequence numbers
//!
//! Stream ids come from an atomic increment-and-fetch counter in a
//! collection of its own, one per fact store. Sequences follow the last
//! fact persisted in the stream, so an aborted append leaves no gap.
//! Concurrent appends to one stream can be handed the same sequence; the
//! unique `(streamId, sequence)` index lets exactly one of them persist.

use crate::Database;
use factstreams_core::document::fields;
use factstreams_core::{Sequence, StreamId};
use factstreams_storage::{Filter, Query, StoreError};
use serde_json::Value;

const STREAM_ID_KEY: &str = "streamId";
const COUNTER_INDEX: &[&str] = &["key"];

/// Issues new stream ids and the next sequence of a stream
#[derive(Clone)]
pub struct SequenceGenerator {
    db: Database,
    collection: String,
    facts: String,
}

impl SequenceGenerator {
    /// Counters live in `collection`; positions are read from `facts`
    pub fn new(db: Database, collection: impl Into<String>, facts: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
            facts: facts.into(),
        }
    }

    /// Declare the counters collection and its key index
    pub async fn init(&self) -> Result<(), StoreError> {
        self.db
            .ensure_unique_index(&self.collection, COUNTER_INDEX)
            .await
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// A stream id with no facts, never issued before by this generator
    ///
    /// Ids already taken by explicit appends are skipped.
    pub async fn next_stream_id(&self) -> Result<StreamId, StoreError> {
        loop {
            let id = self.db.increment(&self.collection, STREAM_ID_KEY).await?;
            let taken = self
                .db
                .find_one(&self.facts, fields::STREAM_ID, &Value::from(id))
                .await?
                .is_some();
            if !taken {
                return Ok(StreamId(id));
            }
            tracing::debug!(stream_id = id, "stream id already in use, skipping");
        }
    }

    /// One past the last persisted sequence of `stream_id`, starting at 1
    pub async fn next_sequence(&self, stream_id: StreamId) -> Result<Sequence, StoreError> {
        let query = Query::matching(Filter::eq(fields::STREAM_ID, stream_id.0))
            .sorted_by_desc(fields::SEQUENCE)
            .limit(1);
        let last = self
            .db
            .scan(&self.facts, &query)
            .await?
            .first()
            .and_then(|doc| doc.get(fields::SEQUENCE))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(Sequence(last + 1))
    }
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
