// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the fact store and views

use factstreams_core::{CodecError, ConfigError, Sequence, StreamId};
use factstreams_storage::StoreError;
use thiserror::Error;

/// Error returned by a user hook
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a user reducer or done handler
pub type ReducerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from fact store operations
#[derive(Debug, Error)]
pub enum FactStoreError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("before-append hook failed: {0}")]
    BeforeAppend(#[source] HookError),
    /// The fact is already persisted when this is returned
    #[error("after-append hook failed for stream {stream_id} at sequence {sequence}: {source}")]
    AfterAppend {
        stream_id: StreamId,
        sequence: Sequence,
        #[source]
        source: HookError,
    },
}

impl FactStoreError {
    /// True when the fact collided with an existing `(streamId, sequence)`
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, FactStoreError::Store(e) if e.is_duplicate_key())
    }
}

/// Errors from replaying or materializing a view
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("unexpected fact type: \"{0}\"")]
    UnexpectedFactType(String),
    #[error("reducer for \"{fact_type}\" failed on stream {stream_id} at sequence {sequence}: {source}")]
    Reducer {
        fact_type: String,
        stream_id: StreamId,
        sequence: Sequence,
        #[source]
        source: ReducerError,
    },
    #[error("done handler failed on stream {stream_id}: {source}")]
    Done {
        stream_id: StreamId,
        #[source]
        source: ReducerError,
    },
    #[error("fact store error: {0}")]
    FactStore(#[from] FactStoreError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("view state must serialize to an object, got {0}")]
    NotAnObject(String),
}
