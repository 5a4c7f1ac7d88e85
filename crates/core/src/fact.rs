// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Facts: immutable records of something that happened to a stream
//!
//! A fact belongs to exactly one stream and carries a 1-based, gap-free
//! sequence number within it. Payloads are tagged variants: the
//! discriminator string selects the reducer a view runs for the fact.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stream of facts
///
/// Issued by the fact store's counter, starting at 1. The value 0 is
/// reserved for [`StreamId::NEW`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl StreamId {
    /// Sentinel asking `append` to allocate a fresh stream
    pub const NEW: StreamId = StreamId(0);

    pub fn is_new(self) -> bool {
        self == Self::NEW
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shorthand for [`StreamId::NEW`]
pub const NEW: StreamId = StreamId::NEW;

/// Position of a fact within its stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(pub u64);

impl Sequence {
    /// Carried by facts that have not been appended yet
    pub const PROVISIONAL: Sequence = Sequence(0);
    pub const FIRST: Sequence = Sequence(1);

    pub fn is_provisional(self) -> bool {
        self == Self::PROVISIONAL
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a fact, tagged by its type discriminator
///
/// Implementations serialize to an object of the shape
/// `{"type": <discriminator>, "data": <payload>}`. For enums this is what
/// `#[serde(tag = "type", content = "data")]` produces; unit variants may
/// omit `data`.
pub trait FactData: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The discriminator string of this payload
    fn fact_type(&self) -> &str;
}

/// Caller context attached to every fact
pub trait FactMetadata: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> FactMetadata for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Schemaless payload accepting any type discriminator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Untyped {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Untyped {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

impl FactData for Untyped {
    fn fact_type(&self) -> &str {
        &self.kind
    }
}

/// An immutable fact, as submitted to or returned by the fact store
#[derive(Debug, Clone, PartialEq)]
pub struct Fact<D, M = serde_json::Value> {
    pub stream_id: StreamId,
    pub sequence: Sequence,
    /// Assigned by the store when the fact is persisted
    pub time: DateTime<Utc>,
    pub data: D,
    pub metadata: M,
}

impl<D: FactData, M> Fact<D, M> {
    pub fn fact_type(&self) -> &str {
        self.data.fact_type()
    }
}

/// Build a fact ready for `append`
///
/// The sequence is provisional and the time is the Unix epoch; both are
/// overwritten when the fact is persisted. Pass [`NEW`] to start a stream.
pub fn create_fact<D: FactData, M>(stream_id: StreamId, data: D, metadata: M) -> Fact<D, M> {
    Fact {
        stream_id,
        sequence: Sequence::PROVISIONAL,
        time: DateTime::<Utc>::UNIX_EPOCH,
        data,
        metadata,
    }
}

#[cfg(test)]
#[path = "fact_tests.rs"]
mod tests;
