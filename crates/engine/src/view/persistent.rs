// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Views materialized into a collection, one document per stream

use super::TransientView;
use crate::error::{HookError, ViewError};
use crate::hooks::AfterAppend;
use crate::Database;
use async_trait::async_trait;
use factstreams_core::{Document, Fact, FactData, FactMetadata, StreamId};
use factstreams_storage::{Filter, Query};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_ID_FIELD: &str = "_id";

/// Where a persistent view keeps its documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentOptions {
    pub collection: String,
    /// Field holding the stream id in each materialized document
    pub id_field: String,
}

impl PersistentOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }
}

/// A view kept in sync with the fact log
///
/// Every append to a stream replays that stream and upserts the result, or
/// deletes the document when the terminal state is `None`. The rebuild has
/// finished by the time `append` returns.
pub struct PersistentView<S, D, M = Value> {
    transient: TransientView<S, D, M>,
    db: Database,
    options: PersistentOptions,
}

impl<S, D, M> Clone for PersistentView<S, D, M> {
    fn clone(&self) -> Self {
        Self {
            transient: self.transient.clone(),
            db: self.db.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S, D, M> PersistentView<S, D, M>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    D: FactData,
    M: FactMetadata,
{
    pub(crate) async fn open(
        transient: TransientView<S, D, M>,
        db: Database,
        options: PersistentOptions,
    ) -> Result<Self, ViewError> {
        db.ensure_unique_index(&options.collection, &[options.id_field.as_str()])
            .await?;
        Ok(Self {
            transient,
            db,
            options,
        })
    }

    pub fn collection(&self) -> &str {
        &self.options.collection
    }

    pub fn id_field(&self) -> &str {
        &self.options.id_field
    }

    /// Terminal state of `stream_id`, computed from the log without
    /// touching the materialized document
    pub async fn replay(&self, stream_id: StreamId) -> Result<Option<S>, ViewError> {
        self.transient.replay(stream_id).await
    }

    /// Re-derive the materialized document of one stream
    pub async fn rebuild(&self, stream_id: StreamId) -> Result<Option<S>, ViewError> {
        let state = self.replay(stream_id).await?;
        let key = Value::from(stream_id.0);

        match &state {
            None => {
                let existed = self
                    .db
                    .delete(self.collection(), self.id_field(), &key)
                    .await?;
                tracing::debug!(
                    collection = self.collection(),
                    %stream_id,
                    existed,
                    "view document deleted"
                );
            }
            Some(state) => {
                let doc = match serde_json::to_value(state)? {
                    Value::Object(doc) => doc,
                    other => return Err(ViewError::NotAnObject(json_kind(&other).to_string())),
                };
                self.db
                    .replace(self.collection(), self.id_field(), &key, doc)
                    .await?;
                tracing::debug!(collection = self.collection(), %stream_id, "view document upserted");
            }
        }

        Ok(state)
    }

    /// Re-derive every stream found in the log; returns the number of streams
    pub async fn rebuild_all(&self) -> Result<usize, ViewError> {
        let mut seen = HashSet::new();
        let mut streams = Vec::new();
        let mut cursor = self.transient.reader().find_all();
        while let Some(fact) = cursor.next().await {
            let stream_id = fact?.stream_id;
            if seen.insert(stream_id) {
                streams.push(stream_id);
            }
        }

        for stream_id in &streams {
            self.rebuild(*stream_id).await?;
        }

        tracing::info!(
            collection = self.collection(),
            streams = streams.len(),
            "view rebuilt"
        );
        Ok(streams.len())
    }

    /// Materialized state of `stream_id`
    pub async fn get(&self, stream_id: StreamId) -> Result<Option<S>, ViewError> {
        match self.find_one(stream_id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc))?)),
            None => Ok(None),
        }
    }

    /// Materialized document of `stream_id`, as stored
    pub async fn find_one(&self, stream_id: StreamId) -> Result<Option<Document>, ViewError> {
        let key = Value::from(stream_id.0);
        Ok(self
            .db
            .find_one(self.collection(), self.id_field(), &key)
            .await?)
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<Document>, ViewError> {
        Ok(self.db.scan(self.collection(), query).await?)
    }

    pub async fn count(&self, filter: Option<&Filter>) -> Result<u64, ViewError> {
        Ok(self.db.count(self.collection(), filter).await?)
    }

    pub(crate) fn rebuild_hook(&self) -> RebuildOnAppend<S, D, M> {
        RebuildOnAppend { view: self.clone() }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// After-append hook keeping a persistent view in sync
pub(crate) struct RebuildOnAppend<S, D, M> {
    view: PersistentView<S, D, M>,
}

#[async_trait]
impl<S, D, M> AfterAppend<D, M> for RebuildOnAppend<S, D, M>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    D: FactData,
    M: FactMetadata,
{
    async fn after_append(&self, fact: &Fact<D, M>) -> Result<(), HookError> {
        match self.view.rebuild(fact.stream_id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    collection = self.view.collection(),
                    stream_id = %fact.stream_id,
                    error = %e,
                    "view rebuild failed"
                );
                Err(Box::new(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "persistent_tests.rs"]
mod tests;
