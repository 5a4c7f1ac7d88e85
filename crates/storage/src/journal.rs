// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable document store backed by an append-only journal
//!
//! Every mutation is written as one checksummed JSON line and synced before
//! it is applied in memory. Opening the journal replays it. A torn final
//! line (crash mid-write) is cut off; corruption anywhere else is an error.

use crate::collections::{Collections, Mutation, Outcome};
use crate::query::{Filter, Query};
use crate::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    seq: u64,
    mutation: Mutation,
    checksum: u32,
}

impl JournalEntry {
    fn new(seq: u64, mutation: Mutation) -> Result<Self, StoreError> {
        let checksum = checksum(&mutation)?;
        Ok(Self {
            seq,
            mutation,
            checksum,
        })
    }

    fn verify(&self) -> bool {
        checksum(&self.mutation).is_ok_and(|c| c == self.checksum)
    }
}

fn checksum(mutation: &Mutation) -> Result<u32, StoreError> {
    let json = serde_json::to_string(mutation)?;
    Ok(crc32fast::hash(json.as_bytes()))
}

struct Journal {
    file: File,
    sequence: u64,
    state: Collections,
    tear_next_write: bool,
}

impl Journal {
    /// Append one terminated line and sync it; on failure the file is cut
    /// back to its previous length so no fragment is left behind
    fn append_line(&mut self, line: &str) -> Result<(), StoreError> {
        let len = self.file.metadata()?.len();
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        if let Err(e) = self.write_synced(&bytes) {
            tracing::warn!(len, error = %e, "journal write failed, rolling back");
            self.file.set_len(len)?;
            return Err(e.into());
        }
        Ok(())
    }

    fn write_synced(&mut self, bytes: &[u8]) -> io::Result<()> {
        if std::mem::take(&mut self.tear_next_write) {
            self.file.write_all(&bytes[..bytes.len() / 2])?;
            return Err(io::Error::other("torn write"));
        }
        self.file.write_all(bytes)?;
        self.file.sync_all()
    }
}

/// Document store persisted to a journal file
pub struct JournalStore {
    path: PathBuf,
    inner: Mutex<Journal>,
}

impl JournalStore {
    /// Open or create a journal at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (state, sequence, valid_len) = Self::replay(path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        if file.metadata()?.len() > valid_len {
            tracing::warn!(
                path = %path.display(),
                valid_len,
                "truncating torn journal tail"
            );
            file.set_len(valid_len)?;
        }

        tracing::debug!(path = %path.display(), entries = sequence, "journal opened");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Journal {
                file,
                sequence,
                state,
                tear_next_write: false,
            }),
        })
    }

    /// Rebuild state from the journal; returns the state, the last entry
    /// sequence and the byte length of the valid prefix
    fn replay(path: &Path) -> Result<(Collections, u64, u64), StoreError> {
        let content = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok((Collections::new(), 0, 0));
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = Collections::new();
        let mut sequence = 0;
        let mut valid_len = 0u64;
        let mut offset = 0usize;
        let mut line_number = 0usize;

        while offset < content.len() {
            line_number += 1;
            let rest = &content[offset..];
            let (line, consumed, terminated) = match rest.iter().position(|b| *b == b'\n') {
                Some(end) => (&rest[..end], end + 1, true),
                None => (rest, rest.len(), false),
            };
            offset += consumed;

            if line.iter().all(u8::is_ascii_whitespace) {
                if terminated {
                    valid_len = offset as u64;
                }
                continue;
            }

            let entry = serde_json::from_slice::<JournalEntry>(line)
                .map_err(|e| e.to_string())
                .and_then(|entry| {
                    if entry.verify() {
                        Ok(entry)
                    } else {
                        Err("checksum mismatch".to_string())
                    }
                });

            match entry {
                Ok(entry) if terminated => {
                    state.apply(entry.mutation)?;
                    sequence = entry.seq;
                    valid_len = offset as u64;
                }
                // Unterminated or damaged final line: a write torn by a crash
                Ok(_) => break,
                Err(_) if offset >= content.len() => break,
                Err(reason) => {
                    return Err(StoreError::Corrupt {
                        line: line_number,
                        reason,
                    })
                }
            }
        }

        Ok((state, sequence, valid_len))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written to the journal
    pub fn entries(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sequence
    }

    /// Make the next journal write stop halfway and fail
    #[cfg(any(test, feature = "test-support"))]
    pub fn tear_next_write(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .tear_next_write = true;
    }

    fn mutate(&self, mutation: Mutation) -> Result<Outcome, StoreError> {
        let mut journal = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        // Rejected mutations never reach the journal
        journal.state.check(&mutation)?;

        let entry = JournalEntry::new(journal.sequence + 1, mutation)?;
        let line = serde_json::to_string(&entry)?;
        journal.append_line(&line)?;
        journal.sequence = entry.seq;

        journal.state.apply(entry.mutation)
    }

    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> T {
        let journal = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&journal.state)
    }
}

#[async_trait]
impl DocumentStore for JournalStore {
    async fn increment(&self, collection: &str, key: &str) -> Result<u64, StoreError> {
        let outcome = self.mutate(Mutation::Increment {
            collection: collection.to_string(),
            key: key.to_string(),
        })?;
        outcome.counter()
    }

    async fn ensure_unique_index(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> Result<(), StoreError> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        // Indexes are re-declared on every startup; only journal new ones
        if self.read(|state| state.has_unique_index(collection, &fields)) {
            return Ok(());
        }
        self.mutate(Mutation::EnsureUniqueIndex {
            collection: collection.to_string(),
            fields,
        })?;
        Ok(())
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.mutate(Mutation::Insert {
            collection: collection.to_string(),
            document,
        })?;
        Ok(())
    }

    async fn scan(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        Ok(self.read(|state| state.scan(collection, query)))
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.read(|state| state.find_one(collection, field, value)))
    }

    async fn count(&self, collection: &str, filter: Option<&Filter>) -> Result<u64, StoreError> {
        Ok(self.read(|state| state.count(collection, filter)))
    }

    async fn replace(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        document: Document,
    ) -> Result<(), StoreError> {
        self.mutate(Mutation::Replace {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.clone(),
            document,
        })?;
        Ok(())
    }

    async fn delete(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, StoreError> {
        let outcome = self.mutate(Mutation::Delete {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.clone(),
        })?;
        Ok(outcome == Outcome::Deleted(true))
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read(Collections::names))
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
