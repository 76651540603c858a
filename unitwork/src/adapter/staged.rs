// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Staged transaction handle shared by the bundled adapters
//!
//! Writes are staged on the handle while intents are applied and only reach
//! the store when the adapter commits. Rolling back therefore only has to
//! drop the staged writes.

use crate::error::{UowError, UowResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a transaction within one adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Get the underlying ID value
    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn from_u64(id: u64) -> Self {
        TransactionId(id)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Monotonic source of transaction IDs
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    last: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn next_id(&self) -> TransactionId {
        TransactionId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// A single write waiting for commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagedWrite {
    /// Write a new record; the key must not exist yet
    Insert {
        collection: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Overwrite an existing record
    Update {
        collection: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Remove an existing record
    Remove { collection: String, key: Vec<u8> },
}

impl StagedWrite {
    pub fn collection(&self) -> &str {
        match self {
            StagedWrite::Insert { collection, .. }
            | StagedWrite::Update { collection, .. }
            | StagedWrite::Remove { collection, .. } => collection,
        }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            StagedWrite::Insert { key, .. }
            | StagedWrite::Update { key, .. }
            | StagedWrite::Remove { key, .. } => key,
        }
    }

    /// Value to store, `None` for removals
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            StagedWrite::Insert { value, .. } | StagedWrite::Update { value, .. } => Some(value),
            StagedWrite::Remove { .. } => None,
        }
    }

    /// Key under which the record lives in the backing store
    pub fn storage_key(&self) -> Vec<u8> {
        storage_key(self.collection(), self.key())
    }

    fn describe(&self) -> String {
        format!(
            "{}/{}",
            self.collection(),
            String::from_utf8_lossy(self.key())
        )
    }
}

/// Composite store key: `collection`, a NUL separator, then the record key
pub fn storage_key(collection: &str, key: &[u8]) -> Vec<u8> {
    let mut out = collection_prefix(collection);
    out.extend_from_slice(key);
    out
}

/// Prefix shared by every record of `collection`
pub fn collection_prefix(collection: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(collection.len() + 1);
    out.extend_from_slice(collection.as_bytes());
    out.push(0);
    out
}

/// Transaction handle holding writes until commit
///
/// Intents of one category may be applied concurrently through a shared
/// reference, so staging goes through an internal lock.
#[derive(Debug)]
pub struct StagedTransaction {
    id: TransactionId,
    writes: Mutex<Vec<StagedWrite>>,
}

impl StagedTransaction {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn stage(&self, write: StagedWrite) {
        self.writes.lock().push(write);
    }

    /// Snapshot of the staged writes in staging order
    pub fn writes(&self) -> Vec<StagedWrite> {
        self.writes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.lock().is_empty()
    }
}

/// Commit-time constraint check for a sequence of staged writes
///
/// Tracks keys already touched by earlier writes of the same transaction so
/// that, for example, an insert followed by an update of the same key passes.
#[derive(Debug, Default)]
pub struct WriteValidator {
    overlay: HashMap<Vec<u8>, bool>,
}

impl WriteValidator {
    /// Presence of `storage_key` as seen by earlier writes, if any touched it
    pub fn known(&self, storage_key: &[u8]) -> Option<bool> {
        self.overlay.get(storage_key).copied()
    }

    /// Check `write` given whether its key is currently present, then record its effect
    pub fn check(&mut self, write: &StagedWrite, present: bool) -> UowResult<()> {
        match write {
            StagedWrite::Insert { .. } if present => {
                return Err(UowError::Conflict(format!(
                    "{} already exists",
                    write.describe()
                )));
            }
            StagedWrite::Update { .. } | StagedWrite::Remove { .. } if !present => {
                return Err(UowError::NotFound(write.describe()));
            }
            _ => {}
        }

        let now_present = !matches!(write, StagedWrite::Remove { .. });
        self.overlay.insert(write.storage_key(), now_present);
        Ok(())
    }
}
