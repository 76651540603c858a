// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory transaction adapter for testing

use super::staged::{
    collection_prefix, storage_key, StagedTransaction, StagedWrite, TransactionId,
    TransactionIdGenerator, WriteValidator,
};
use super::traits::TransactionAdapter;
use super::types::{AdapterCallCounts, AdapterOp, AdapterType};
use crate::entity::EntityStore;
use crate::error::{UowError, UowResult};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};

/// In-memory adapter backed by a single key-value map
///
/// Commit validates and applies all staged writes under one write lock, so a
/// transaction is either applied completely or not at all.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    ids: TransactionIdGenerator,
    active: Mutex<HashSet<TransactionId>>,
    calls: Mutex<AdapterCallCounts>,
    faults: Mutex<HashMap<AdapterOp, usize>>,
}

impl MemoryAdapter {
    /// Create a new, empty memory adapter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adapter_type(&self) -> AdapterType {
        AdapterType::Memory
    }

    /// Make the next call to `op` fail once
    ///
    /// Faults accumulate: arming the same operation twice fails its next two calls.
    pub fn fail_next(&self, op: AdapterOp) {
        *self.faults.lock().entry(op).or_insert(0) += 1;
    }

    pub fn call_counts(&self) -> AdapterCallCounts {
        *self.calls.lock()
    }

    /// Transactions begun but not yet released
    pub fn active_transactions(&self) -> Vec<TransactionId> {
        let mut ids: Vec<_> = self.active.lock().iter().copied().collect();
        ids.sort_by_key(|id| id.id());
        ids
    }

    /// Number of committed records across all collections
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn record_call(&self, op: AdapterOp) -> UowResult<()> {
        self.calls.lock().record(op);
        let mut faults = self.faults.lock();
        if let Some(remaining) = faults.get_mut(&op) {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(&op);
            }
            return Err(op.injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionAdapter for MemoryAdapter {
    type Tx = StagedTransaction;

    async fn begin(&self) -> UowResult<StagedTransaction> {
        self.record_call(AdapterOp::Begin)?;
        let id = self.ids.next_id();
        self.active.lock().insert(id);
        log::debug!("memory adapter: begin {}", id);
        Ok(StagedTransaction::new(id))
    }

    async fn commit(&self, tx: &StagedTransaction) -> UowResult<()> {
        self.record_call(AdapterOp::Commit)?;
        let writes = tx.writes();

        let mut data = self.data.write();
        let mut validator = WriteValidator::default();
        for write in &writes {
            let key = write.storage_key();
            let present = match validator.known(&key) {
                Some(present) => present,
                None => data.contains_key(&key),
            };
            validator.check(write, present)?;
        }

        for write in writes {
            let key = write.storage_key();
            match write {
                StagedWrite::Insert { value, .. } | StagedWrite::Update { value, .. } => {
                    data.insert(key, value);
                }
                StagedWrite::Remove { .. } => {
                    data.remove(&key);
                }
            }
        }
        log::debug!("memory adapter: committed {} ({} writes)", tx.id(), tx.len());
        Ok(())
    }

    async fn rollback(&self, tx: &StagedTransaction) -> UowResult<()> {
        self.record_call(AdapterOp::Rollback)?;
        log::debug!(
            "memory adapter: discarding {} staged writes of {}",
            tx.len(),
            tx.id()
        );
        Ok(())
    }

    async fn release(&self, tx: StagedTransaction) -> UowResult<()> {
        // Deregister before the fault check so an injected failure still frees the handle.
        let known = self.active.lock().remove(&tx.id());
        self.record_call(AdapterOp::Release)?;
        if !known {
            return Err(UowError::release(format!("{} is not active", tx.id())));
        }
        Ok(())
    }
}

impl EntityStore for MemoryAdapter {
    fn get_raw(&self, collection: &str, key: &[u8]) -> UowResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(&storage_key(collection, key)).cloned())
    }

    fn count(&self, collection: &str) -> UowResult<usize> {
        let prefix = collection_prefix(collection);
        Ok(self
            .data
            .read()
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count())
    }
}
