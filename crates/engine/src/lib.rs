// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! factstreams engine: the fact log and the views derived from it
//!
//! - `FactStore` - append-only, per-stream ordered log with hooks
//! - `SequenceGenerator` - stream identifiers and per-stream sequences
//! - `View` - reducer pipeline finalized into a `TransientView` or a
//!   `PersistentView` kept in sync on every append

mod cursor;
mod database;
mod error;
mod hooks;
mod sequence;
mod store;
mod view;

pub use cursor::{FactCursor, FactReader};
pub use database::FactStreams;
pub use error::{FactStoreError, HookError, ReducerError, ViewError};
pub use hooks::{AfterAppend, BeforeAppend};
pub use sequence::SequenceGenerator;
pub use store::FactStore;
pub use view::{PersistentOptions, PersistentView, TransientView, View};

pub use factstreams_core::{
    create_fact, Fact, FactData, FactMetadata, FactStoreConfig, Sequence, StreamId, Untyped, NEW,
};

/// Shared handle to the backing document database
pub type Database = std::sync::Arc<dyn factstreams_storage::DocumentStore>;
