// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! factstreams-core: Fact model shared by the fact store and its views
//!
//! This crate provides:
//! - Stream identifiers, sequence numbers and the `NEW` stream sentinel
//! - The `Fact` record and the `FactData` payload contract
//! - The document codec used to persist facts
//! - Clock abstraction and fact store configuration

pub mod clock;
pub mod config;
pub mod document;
pub mod fact;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, FactStoreConfig};
pub use document::{CodecError, Document};
pub use fact::{create_fact, Fact, FactData, FactMetadata, Sequence, StreamId, Untyped, NEW};
