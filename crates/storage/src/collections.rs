// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory collection state shared by every store implementation
//!
//! State only changes through [`Mutation`]s, so a journal of mutations
//! replays to the same state.

use crate::query::{Filter, Query};
use crate::{Document, StoreError, StoreOp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const COUNTER_KEY: &str = "key";
const COUNTER_VALUE: &str = "value";

/// A state change, as recorded in a journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Increment {
        collection: String,
        key: String,
    },
    EnsureUniqueIndex {
        collection: String,
        fields: Vec<String>,
    },
    Insert {
        collection: String,
        document: Document,
    },
    Replace {
        collection: String,
        field: String,
        value: Value,
        document: Document,
    },
    Delete {
        collection: String,
        field: String,
        value: Value,
    },
}

/// Result of applying a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Counter(u64),
    Deleted(bool),
}

impl Outcome {
    /// Value of an increment
    pub fn counter(self) -> Result<u64, StoreError> {
        match self {
            Outcome::Counter(value) => Ok(value),
            outcome => Err(StoreError::UnexpectedOutcome {
                op: StoreOp::Increment,
                outcome,
            }),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Collection {
    /// Documents in insertion order
    docs: Vec<Document>,
    unique: Vec<Vec<String>>,
}

impl Collection {
    fn position(&self, field: &str, value: &Value) -> Option<usize> {
        self.docs.iter().position(|d| d.get(field) == Some(value))
    }

    /// Check `doc` against every unique index, ignoring the document at `skip`
    fn check_unique(&self, name: &str, doc: &Document, skip: Option<usize>) -> Result<(), StoreError> {
        for fields in &self.unique {
            let clash = self.docs.iter().enumerate().any(|(i, existing)| {
                Some(i) != skip && fields.iter().all(|f| existing.get(f) == doc.get(f))
            });
            if clash {
                return Err(duplicate(name, fields, doc));
            }
        }
        Ok(())
    }
}

fn duplicate(collection: &str, fields: &[String], doc: &Document) -> StoreError {
    let key = fields
        .iter()
        .map(|f| format!("{}: {}", f, doc.get(f).unwrap_or(&Value::Null)))
        .collect::<Vec<_>>()
        .join(", ");
    StoreError::DuplicateKey {
        collection: collection.to_string(),
        key: format!("{{ {} }}", key),
    }
}

/// All collections of one database
#[derive(Debug, Default, Clone)]
pub struct Collections {
    collections: BTreeMap<String, Collection>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a mutation without applying it
    pub fn check(&self, mutation: &Mutation) -> Result<(), StoreError> {
        match mutation {
            Mutation::Insert {
                collection,
                document,
            } => match self.collections.get(collection) {
                Some(c) => c.check_unique(collection, document, None),
                None => Ok(()),
            },
            Mutation::Replace {
                collection,
                field,
                value,
                document,
            } => match self.collections.get(collection) {
                Some(c) => {
                    let doc = keyed(document.clone(), field, value);
                    c.check_unique(collection, &doc, c.position(field, value))
                }
                None => Ok(()),
            },
            Mutation::EnsureUniqueIndex { collection, fields } => {
                let Some(c) = self.collections.get(collection) else {
                    return Ok(());
                };
                for (i, doc) in c.docs.iter().enumerate() {
                    let clash = c.docs[i + 1..]
                        .iter()
                        .any(|other| fields.iter().all(|f| other.get(f) == doc.get(f)));
                    if clash {
                        return Err(duplicate(collection, fields, doc));
                    }
                }
                Ok(())
            }
            Mutation::Increment { .. } | Mutation::Delete { .. } => Ok(()),
        }
    }

    /// Apply a mutation, validating it first
    pub fn apply(&mut self, mutation: Mutation) -> Result<Outcome, StoreError> {
        self.check(&mutation)?;

        let outcome = match mutation {
            Mutation::Increment { collection, key } => {
                let c = self.collections.entry(collection).or_default();
                let key = Value::String(key);
                let next = match c.position(COUNTER_KEY, &key) {
                    Some(i) => {
                        let counter = &mut c.docs[i];
                        let next = counter
                            .get(COUNTER_VALUE)
                            .and_then(Value::as_u64)
                            .unwrap_or(0)
                            + 1;
                        counter.insert(COUNTER_VALUE.to_string(), Value::from(next));
                        next
                    }
                    None => {
                        let mut counter = Document::new();
                        counter.insert(COUNTER_KEY.to_string(), key);
                        counter.insert(COUNTER_VALUE.to_string(), Value::from(1u64));
                        c.docs.push(counter);
                        1
                    }
                };
                Outcome::Counter(next)
            }
            Mutation::EnsureUniqueIndex { collection, fields } => {
                let c = self.collections.entry(collection).or_default();
                if !c.unique.contains(&fields) {
                    c.unique.push(fields);
                }
                Outcome::Done
            }
            Mutation::Insert {
                collection,
                document,
            } => {
                self.collections
                    .entry(collection)
                    .or_default()
                    .docs
                    .push(document);
                Outcome::Done
            }
            Mutation::Replace {
                collection,
                field,
                value,
                document,
            } => {
                let c = self.collections.entry(collection).or_default();
                let position = c.position(&field, &value);
                let doc = keyed(document, &field, &value);
                match position {
                    Some(i) => c.docs[i] = doc,
                    None => c.docs.push(doc),
                }
                Outcome::Done
            }
            Mutation::Delete {
                collection,
                field,
                value,
            } => {
                let removed = match self.collections.get_mut(&collection) {
                    Some(c) => match c.position(&field, &value) {
                        Some(i) => {
                            c.docs.remove(i);
                            true
                        }
                        None => false,
                    },
                    None => false,
                };
                Outcome::Deleted(removed)
            }
        };

        Ok(outcome)
    }

    pub fn scan(&self, collection: &str, query: &Query) -> Vec<Document> {
        match self.collections.get(collection) {
            Some(c) => query.apply(c.docs.iter()),
            None => Vec::new(),
        }
    }

    pub fn find_one(&self, collection: &str, field: &str, value: &Value) -> Option<Document> {
        let c = self.collections.get(collection)?;
        c.position(field, value).map(|i| c.docs[i].clone())
    }

    pub fn count(&self, collection: &str, filter: Option<&Filter>) -> u64 {
        match self.collections.get(collection) {
            Some(c) => c
                .docs
                .iter()
                .filter(|d| filter.map_or(true, |f| f.matches(d)))
                .count() as u64,
            None => 0,
        }
    }

    pub fn has_unique_index(&self, collection: &str, fields: &[String]) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|c| c.unique.iter().any(|f| f == fields))
    }

    /// Collection names, sorted
    pub fn names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }
}

/// The stored form of a replaced document always carries its key
fn keyed(mut document: Document, field: &str, value: &Value) -> Document {
    document.insert(field.to_string(), value.clone());
    document
}

#[cfg(test)]
#[path = "collections_tests.rs"]
mod tests;
