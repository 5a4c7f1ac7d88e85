// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hooks run around fact persistence
//!
//! Async closures implement both traits, so most callers register plain
//! closures:
//!
//! ```ignore
//! store.on_before_append(|mut fact: Fact<Untyped>| async move {
//!     fact.metadata["checked"] = true.into();
//!     Ok(fact)
//! });
//! ```

use crate::error::HookError;
use async_trait::async_trait;
use factstreams_core::{Fact, FactData, FactMetadata};
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Runs before a fact is persisted and may rewrite it
///
/// Returning an error aborts the append; nothing is persisted.
#[async_trait]
pub trait BeforeAppend<D, M>: Send + Sync {
    async fn before_append(&self, fact: Fact<D, M>) -> Result<Fact<D, M>, HookError>;
}

/// Runs after a fact is persisted, before `append` returns
#[async_trait]
pub trait AfterAppend<D, M>: Send + Sync {
    async fn after_append(&self, fact: &Fact<D, M>) -> Result<(), HookError>;
}

#[async_trait]
impl<D, M, F, Fut> BeforeAppend<D, M> for F
where
    D: FactData,
    M: FactMetadata,
    F: Fn(Fact<D, M>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Fact<D, M>, HookError>> + Send,
{
    async fn before_append(&self, fact: Fact<D, M>) -> Result<Fact<D, M>, HookError> {
        self(fact).await
    }
}

#[async_trait]
impl<D, M, F, Fut> AfterAppend<D, M> for F
where
    D: FactData,
    M: FactMetadata,
    F: Fn(Fact<D, M>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send,
{
    async fn after_append(&self, fact: &Fact<D, M>) -> Result<(), HookError> {
        self(fact.clone()).await
    }
}

/// Append-only, ordered registration list
pub(crate) struct HookList<H: ?Sized> {
    hooks: RwLock<Vec<Arc<H>>>,
}

impl<H: ?Sized> HookList<H> {
    pub(crate) fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, hook: Arc<H>) {
        self.hooks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(hook);
    }

    /// Registered hooks in registration order
    pub(crate) fn snapshot(&self) -> Vec<Arc<H>> {
        self.hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hooks.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
