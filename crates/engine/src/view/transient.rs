// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::View;
use crate::cursor::FactReader;
use crate::error::ViewError;
use factstreams_core::{FactData, FactMetadata, StreamId};
use std::sync::Arc;

/// A view replayed from the log on every call
///
/// Replays have no side effects and may run concurrently. Each one reads
/// the log as it is when the replay runs.
pub struct TransientView<S, D, M = serde_json::Value> {
    view: Arc<View<S, D, M>>,
    reader: FactReader<D, M>,
}

impl<S, D, M> Clone for TransientView<S, D, M> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<S, D, M> TransientView<S, D, M>
where
    S: Clone + Send + Sync + 'static,
    D: FactData,
    M: FactMetadata,
{
    pub(crate) fn new(view: View<S, D, M>, reader: FactReader<D, M>) -> Self {
        Self {
            view: Arc::new(view),
            reader,
        }
    }

    /// Terminal state of `stream_id`
    pub async fn replay(&self, stream_id: StreamId) -> Result<Option<S>, ViewError> {
        self.view.fold(&self.reader, stream_id).await
    }

    pub(crate) fn reader(&self) -> &FactReader<D, M> {
        &self.reader
    }
}

#[cfg(test)]
#[path = "transient_tests.rs"]
mod tests;
