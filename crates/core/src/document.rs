// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document codec for persisted facts
//!
//! A persisted fact is the document
//! `{streamId, sequence, type, time, data, metadata}`.

use crate::fact::{Fact, FactData, FactMetadata, Sequence, StreamId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// A JSON object as stored by the backing database
pub type Document = serde_json::Map<String, Value>;

/// Field names of a persisted fact
pub mod fields {
    pub const STREAM_ID: &str = "streamId";
    pub const SEQUENCE: &str = "sequence";
    pub const TYPE: &str = "type";
    pub const TIME: &str = "time";
    pub const DATA: &str = "data";
    pub const METADATA: &str = "metadata";
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fact payload must serialize to an object with a string \"type\" field")]
    PayloadShape,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid field {field}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Encode a fact into its persisted document form
pub fn encode<D: FactData, M: FactMetadata>(fact: &Fact<D, M>) -> Result<Document, CodecError> {
    let payload = match serde_json::to_value(&fact.data)? {
        Value::Object(payload) => payload,
        _ => return Err(CodecError::PayloadShape),
    };
    let kind = match payload.get(fields::TYPE) {
        Some(Value::String(kind)) => kind.clone(),
        _ => return Err(CodecError::PayloadShape),
    };
    let data = payload.get(fields::DATA).cloned().unwrap_or(Value::Null);

    let mut doc = Document::new();
    doc.insert(fields::STREAM_ID.to_string(), Value::from(fact.stream_id.0));
    doc.insert(fields::SEQUENCE.to_string(), Value::from(fact.sequence.0));
    doc.insert(fields::TYPE.to_string(), Value::String(kind));
    doc.insert(fields::TIME.to_string(), serde_json::to_value(fact.time)?);
    doc.insert(fields::DATA.to_string(), data);
    doc.insert(
        fields::METADATA.to_string(),
        serde_json::to_value(&fact.metadata)?,
    );
    Ok(doc)
}

/// Decode a persisted document back into a fact
pub fn decode<D: FactData, M: FactMetadata>(mut doc: Document) -> Result<Fact<D, M>, CodecError> {
    let stream_id = StreamId(take_u64(&doc, fields::STREAM_ID)?);
    let sequence = Sequence(take_u64(&doc, fields::SEQUENCE)?);

    let time: DateTime<Utc> = serde_json::from_value(
        doc.remove(fields::TIME)
            .ok_or(CodecError::MissingField(fields::TIME))?,
    )?;

    let kind = match doc.remove(fields::TYPE) {
        Some(Value::String(kind)) => kind,
        Some(_) => {
            return Err(CodecError::InvalidField {
                field: fields::TYPE,
                expected: "string",
            })
        }
        None => return Err(CodecError::MissingField(fields::TYPE)),
    };

    // Unit variants of adjacently tagged enums carry no content
    let mut payload = Document::new();
    payload.insert(fields::TYPE.to_string(), Value::String(kind));
    match doc.remove(fields::DATA) {
        None | Some(Value::Null) => {}
        Some(data) => {
            payload.insert(fields::DATA.to_string(), data);
        }
    }
    let data: D = serde_json::from_value(Value::Object(payload))?;

    let metadata: M =
        serde_json::from_value(doc.remove(fields::METADATA).unwrap_or(Value::Null))?;

    Ok(Fact {
        stream_id,
        sequence,
        time,
        data,
        metadata,
    })
}

fn take_u64(doc: &Document, field: &'static str) -> Result<u64, CodecError> {
    doc.get(field)
        .ok_or(CodecError::MissingField(field))?
        .as_u64()
        .ok_or(CodecError::InvalidField {
            field,
            expected: "unsigned integer",
        })
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
