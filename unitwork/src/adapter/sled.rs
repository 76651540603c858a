// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled transaction adapter
//!
//! All collections share one sled tree; records are keyed by
//! `collection\0key`. A commit replays the staged writes inside a single sled
//! transaction, so constraint violations and storage errors leave the tree
//! untouched.
//!
//! The database is opened without sled's background flusher; durability comes
//! from the flush after each commit (`SledAdapterConfig::flush_on_commit`) and
//! from [`SledAdapter::flush`]. Once the last handle is dropped nothing keeps
//! the file lock, so the same path can be reopened immediately.

use super::staged::{
    collection_prefix, storage_key, StagedTransaction, StagedWrite, TransactionId,
    TransactionIdGenerator, WriteValidator,
};
use super::traits::TransactionAdapter;
use super::types::{AdapterType, SledAdapterConfig};
use crate::entity::EntityStore;
use crate::error::{UowError, UowResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sled adapter implementation
pub struct SledAdapter {
    db: sled::Db,
    tree: sled::Tree,
    config: SledAdapterConfig,
    ids: TransactionIdGenerator,
    active: Mutex<HashSet<TransactionId>>,
    flush_failures: AtomicU64,
}

impl SledAdapter {
    /// Open the database described by `config`
    pub fn open(config: SledAdapterConfig) -> UowResult<Self> {
        config.validate()?;

        let db_config = if config.temporary {
            sled::Config::new().temporary(true)
        } else {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| UowError::config("sled adapter needs a path"))?;
            sled::Config::new().path(path)
        };
        let db = db_config.flush_every_ms(None).open()?;
        let tree = db.open_tree(&config.tree_name)?;

        log::debug!(
            "sled adapter: opened tree '{}' ({})",
            config.tree_name,
            if config.temporary {
                "temporary".to_string()
            } else {
                format!("{:?}", config.path)
            }
        );

        Ok(Self {
            db,
            tree,
            config,
            ids: TransactionIdGenerator::default(),
            active: Mutex::new(HashSet::new()),
            flush_failures: AtomicU64::new(0),
        })
    }

    /// Open a throwaway database
    pub fn temporary() -> UowResult<Self> {
        Self::open(SledAdapterConfig::temporary())
    }

    pub fn adapter_type(&self) -> AdapterType {
        AdapterType::Sled
    }

    pub fn config(&self) -> &SledAdapterConfig {
        &self.config
    }

    /// Transactions begun but not yet released
    pub fn active_transactions(&self) -> Vec<TransactionId> {
        let mut ids: Vec<_> = self.active.lock().iter().copied().collect();
        ids.sort_by_key(|id| id.id());
        ids
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> UowResult<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Post-commit flushes that failed since the adapter was opened
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    /// Account for the flush that follows a commit
    ///
    /// The writes are already visible in the tree at this point, so a failed
    /// flush must not turn the commit into an error: the coordinator would
    /// report a rollback that never happened.
    fn settle_flush(&self, id: TransactionId, result: sled::Result<usize>) {
        if let Err(e) = result {
            self.flush_failures.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "sled adapter: {} committed but flush to disk failed: {}",
                id,
                e
            );
        }
    }
}

#[async_trait]
impl TransactionAdapter for SledAdapter {
    type Tx = StagedTransaction;

    async fn begin(&self) -> UowResult<StagedTransaction> {
        let id = self.ids.next_id();
        self.active.lock().insert(id);
        log::debug!("sled adapter: begin {}", id);
        Ok(StagedTransaction::new(id))
    }

    async fn commit(&self, tx: &StagedTransaction) -> UowResult<()> {
        let writes = tx.writes();

        let result = self.tree.transaction(|tree| {
            let mut validator = WriteValidator::default();
            for write in &writes {
                let key = write.storage_key();
                let present = match validator.known(&key) {
                    Some(present) => present,
                    None => tree.get(&key)?.is_some(),
                };
                validator
                    .check(write, present)
                    .map_err(ConflictableTransactionError::Abort)?;

                match write {
                    StagedWrite::Insert { value, .. } | StagedWrite::Update { value, .. } => {
                        tree.insert(key, value.as_slice())?;
                    }
                    StagedWrite::Remove { .. } => {
                        tree.remove(key)?;
                    }
                }
            }
            Ok(())
        });

        match result {
            Ok(()) => {}
            Err(TransactionError::Abort(e)) => return Err(e),
            Err(TransactionError::Storage(e)) => return Err(UowError::commit(e.to_string())),
        }

        if self.config.flush_on_commit {
            self.settle_flush(tx.id(), self.db.flush());
        }

        log::debug!("sled adapter: committed {} ({} writes)", tx.id(), writes.len());
        Ok(())
    }

    async fn rollback(&self, tx: &StagedTransaction) -> UowResult<()> {
        // Nothing reached the tree before commit.
        log::debug!(
            "sled adapter: discarding {} staged writes of {}",
            tx.len(),
            tx.id()
        );
        Ok(())
    }

    async fn release(&self, tx: StagedTransaction) -> UowResult<()> {
        if !self.active.lock().remove(&tx.id()) {
            return Err(UowError::release(format!("{} is not active", tx.id())));
        }
        Ok(())
    }
}

impl EntityStore for SledAdapter {
    fn get_raw(&self, collection: &str, key: &[u8]) -> UowResult<Option<Vec<u8>>> {
        Ok(self
            .tree
            .get(storage_key(collection, key))?
            .map(|v| v.to_vec()))
    }

    fn count(&self, collection: &str) -> UowResult<usize> {
        let mut count = 0;
        for entry in self.tree.scan_prefix(collection_prefix(collection)) {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}

impl std::fmt::Debug for SledAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledAdapter")
            .field("config", &self.config)
            .field("active", &self.active.lock().len())
            .finish()
    }
}
