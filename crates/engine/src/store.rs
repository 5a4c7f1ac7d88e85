// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fact log and its append protocol

use crate::cursor::{FactCursor, FactReader};
use crate::error::FactStoreError;
use crate::hooks::{AfterAppend, BeforeAppend, HookList};
use crate::sequence::SequenceGenerator;
use crate::Database;
use factstreams_core::document::{self, fields};
use factstreams_core::{Clock, Fact, FactData, FactMetadata, FactStoreConfig, StreamId, SystemClock};
use std::sync::Arc;
use tracing::Instrument;

const FACT_INDEX: &[&str] = &[fields::STREAM_ID, fields::SEQUENCE];

/// Append-only log of facts, ordered per stream
///
/// Hooks registered on a store live as long as the store. Register them
/// before concurrent appends start. The after-append phase of one append
/// finishes before that of the next begins.
pub struct FactStore<D, M = serde_json::Value> {
    config: FactStoreConfig,
    reader: FactReader<D, M>,
    sequences: SequenceGenerator,
    clock: Arc<dyn Clock>,
    before: HookList<dyn BeforeAppend<D, M>>,
    after: HookList<dyn AfterAppend<D, M>>,
    after_phase: tokio::sync::Mutex<()>,
}

impl<D: FactData, M: FactMetadata> FactStore<D, M> {
    /// Open the fact collection named by `config`, creating its indexes
    pub async fn create(db: Database, config: FactStoreConfig) -> Result<Self, FactStoreError> {
        Self::create_with_clock(db, config, Arc::new(SystemClock)).await
    }

    pub async fn create_with_clock(
        db: Database,
        config: FactStoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FactStoreError> {
        config.validate()?;

        let sequences = SequenceGenerator::new(
            db.clone(),
            config.counters_collection(),
            config.name.clone(),
        );
        sequences.init().await?;
        db.ensure_unique_index(&config.name, FACT_INDEX).await?;

        tracing::debug!(
            store = %config.name,
            counters = sequences.collection(),
            "fact store ready"
        );

        Ok(Self {
            reader: FactReader::new(db, config.name.clone(), config.batch_size),
            sequences,
            clock,
            config,
            before: HookList::new(),
            after: HookList::new(),
            after_phase: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &FactStoreConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        self.reader.database()
    }

    /// Detached read handle on this store's facts
    pub fn reader(&self) -> FactReader<D, M> {
        self.reader.clone()
    }

    pub fn on_before_append<H>(&self, hook: H)
    where
        H: BeforeAppend<D, M> + 'static,
    {
        self.before.push(Arc::new(hook));
    }

    pub fn on_after_append<H>(&self, hook: H)
    where
        H: AfterAppend<D, M> + 'static,
    {
        self.after.push(Arc::new(hook));
    }

    /// Persist a fact and return it as stored
    ///
    /// `StreamId::NEW` allocates a fresh stream. The sequence and time of
    /// the given fact are overwritten. After-append hooks have all finished
    /// when this returns; if one fails, the fact is already persisted.
    pub async fn append(&self, fact: Fact<D, M>) -> Result<Fact<D, M>, FactStoreError> {
        let span = tracing::info_span!(
            "fact_store.append",
            store = %self.config.name,
            fact_type = fact.fact_type(),
            stream_id = tracing::field::Empty,
            sequence = tracing::field::Empty,
        );
        self.append_inner(fact).instrument(span).await
    }

    async fn append_inner(&self, mut fact: Fact<D, M>) -> Result<Fact<D, M>, FactStoreError> {
        if fact.stream_id.is_new() {
            fact.stream_id = self.sequences.next_stream_id().await?;
        }
        tracing::Span::current().record("stream_id", fact.stream_id.0);

        let mut attempt = 1;
        let persisted = loop {
            match self.try_append(fact.clone()).await {
                Ok(persisted) => break persisted,
                Err(e) if e.is_duplicate_key() && attempt < self.config.append_attempts => {
                    tracing::warn!(attempt, error = %e, "sequence collision, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };
        tracing::Span::current().record("sequence", persisted.sequence.0);

        let hooks = self.after.snapshot();
        tracing::debug!(after_hooks = hooks.len(), "persisted");

        // One append's after-hooks at a time
        let _phase = self.after_phase.lock().await;

        for hook in hooks {
            if let Err(source) = hook.after_append(&persisted).await {
                tracing::error!(error = %source, "after-append hook failed");
                return Err(FactStoreError::AfterAppend {
                    stream_id: persisted.stream_id,
                    sequence: persisted.sequence,
                    source,
                });
            }
        }

        Ok(persisted)
    }

    /// Sequence, stamp, run before hooks and insert
    async fn try_append(&self, mut fact: Fact<D, M>) -> Result<Fact<D, M>, FactStoreError> {
        fact.sequence = self.sequences.next_sequence(fact.stream_id).await?;
        fact.time = self.clock.now();

        let hooks = self.before.snapshot();
        for hook in hooks {
            fact = hook.before_append(fact).await.map_err(|e| {
                tracing::warn!(error = %e, "before-append hook aborted append");
                FactStoreError::BeforeAppend(e)
            })?;
        }

        let doc = document::encode(&fact)?;
        self.database().insert(&self.config.name, doc).await?;
        Ok(fact)
    }

    /// Facts of one stream, ascending by sequence
    pub fn find(&self, stream_id: StreamId) -> FactCursor<D, M> {
        self.reader.find(stream_id)
    }

    /// Facts of every stream, in persistence order
    pub fn find_all(&self) -> FactCursor<D, M> {
        self.reader.find_all()
    }

    #[cfg(test)]
    pub(crate) fn after_hook_count(&self) -> usize {
        self.after.len()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
