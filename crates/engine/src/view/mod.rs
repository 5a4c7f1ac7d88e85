// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Views: state derived from a stream by folding its facts through reducers
//!
//! A [`View`] is built once, then finalized against a fact store into either
//! a [`TransientView`] (replayed on demand) or a [`PersistentView`]
//! (materialized into a collection and rebuilt after every append).
//!
//! Per stream, the state starts at the initial state (`None` unless set),
//! each fact is folded in sequence order by the reducer registered for its
//! type, and the done handler runs once after the last fact. A terminal
//! state of `None` means the stream has no materialized representation.

mod persistent;
mod transient;

pub use persistent::{PersistentOptions, PersistentView};
pub use transient::TransientView;

use crate::cursor::FactReader;
use crate::error::{ReducerError, ViewError};
use crate::store::FactStore;
use factstreams_core::{Fact, FactData, FactMetadata, StreamId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

type Reducer<S, D, M> =
    Arc<dyn Fn(Option<S>, &Fact<D, M>) -> Result<Option<S>, ReducerError> + Send + Sync>;
type DoneHandler<S> = Arc<dyn Fn(Option<S>) -> Result<Option<S>, ReducerError> + Send + Sync>;

/// Reducer pipeline for one state type
pub struct View<S, D, M = serde_json::Value> {
    initial: Option<S>,
    reducers: HashMap<String, Reducer<S, D, M>>,
    unknown: Option<Reducer<S, D, M>>,
    done: Option<DoneHandler<S>>,
}

impl<S: Clone, D, M> Clone for View<S, D, M> {
    fn clone(&self) -> Self {
        Self {
            initial: self.initial.clone(),
            reducers: self.reducers.clone(),
            unknown: self.unknown.clone(),
            done: self.done.clone(),
        }
    }
}

impl<S, D, M> Default for View<S, D, M> {
    fn default() -> Self {
        Self {
            initial: None,
            reducers: HashMap::new(),
            unknown: None,
            done: None,
        }
    }
}

impl<S, D, M> View<S, D, M>
where
    S: Clone + Send + Sync + 'static,
    D: FactData,
    M: FactMetadata,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// State the fold starts from, instead of `None`
    pub fn initial_state(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Reduce facts of `fact_type`; a later registration for the same type
    /// replaces the earlier one
    pub fn on<F>(mut self, fact_type: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(Option<S>, &Fact<D, M>) -> Result<Option<S>, ReducerError> + Send + Sync + 'static,
    {
        self.reducers.insert(fact_type.into(), Arc::new(reducer));
        self
    }

    /// Reduce facts with no registered reducer, instead of failing
    pub fn on_unknown_fact<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<S>, &Fact<D, M>) -> Result<Option<S>, ReducerError> + Send + Sync + 'static,
    {
        self.unknown = Some(Arc::new(handler));
        self
    }

    /// Transform the state once after the last fact of a replay
    pub fn on_done<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<S>) -> Result<Option<S>, ReducerError> + Send + Sync + 'static,
    {
        self.done = Some(Arc::new(handler));
        self
    }

    /// Finalize into a view replayed on demand over `store`
    pub fn create_transient(self, store: &FactStore<D, M>) -> TransientView<S, D, M> {
        TransientView::new(self, store.reader())
    }

    /// Finalize into a view materialized in `collection`, keyed by `_id`
    pub async fn create_persistent(
        self,
        store: &FactStore<D, M>,
        collection: impl Into<String>,
    ) -> Result<PersistentView<S, D, M>, ViewError>
    where
        S: Serialize + DeserializeOwned,
    {
        self.create_persistent_with(store, PersistentOptions::new(collection))
            .await
    }

    /// Finalize into a materialized view and register its rebuild hook
    pub async fn create_persistent_with(
        self,
        store: &FactStore<D, M>,
        options: PersistentOptions,
    ) -> Result<PersistentView<S, D, M>, ViewError>
    where
        S: Serialize + DeserializeOwned,
    {
        let transient = self.create_transient(store);
        let view = PersistentView::open(transient, store.database().clone(), options).await?;
        store.on_after_append(view.rebuild_hook());
        Ok(view)
    }

    /// Fold one stream from the log into its terminal state
    pub(crate) async fn fold(
        &self,
        reader: &FactReader<D, M>,
        stream_id: StreamId,
    ) -> Result<Option<S>, ViewError> {
        let mut state = self.initial.clone();
        let mut cursor = reader.find(stream_id);
        while let Some(fact) = cursor.next().await {
            state = self.apply(state, &fact?)?;
        }
        self.finish(stream_id, state)
    }

    fn apply(&self, state: Option<S>, fact: &Fact<D, M>) -> Result<Option<S>, ViewError> {
        let fact_type = fact.fact_type();
        let reducer = match self.reducers.get(fact_type).or(self.unknown.as_ref()) {
            Some(reducer) => reducer,
            None => return Err(ViewError::UnexpectedFactType(fact_type.to_string())),
        };

        reducer(state, fact).map_err(|source| ViewError::Reducer {
            fact_type: fact_type.to_string(),
            stream_id: fact.stream_id,
            sequence: fact.sequence,
            source,
        })
    }

    fn finish(&self, stream_id: StreamId, state: Option<S>) -> Result<Option<S>, ViewError> {
        match &self.done {
            Some(done) => done(state).map_err(|source| ViewError::Done { stream_id, source }),
            None => Ok(state),
        }
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
