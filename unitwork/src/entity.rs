// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Serializable entities persisted through a [`StagedTransaction`]
//!
//! Any type implementing [`Entity`] can be queued on a unit of work whose
//! adapter hands out staged transactions. Values are encoded with bincode.

use crate::adapter::{StagedTransaction, StagedWrite, UowObject};
use crate::error::UowResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record type stored under a collection and a primary key
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection (table) the entity belongs to
    const COLLECTION: &'static str;

    /// Primary key bytes
    fn key(&self) -> Vec<u8>;
}

/// Read access to committed records
pub trait EntityStore: Send + Sync {
    /// Committed encoded value for `key` in `collection`
    fn get_raw(&self, collection: &str, key: &[u8]) -> UowResult<Option<Vec<u8>>>;

    /// Number of committed records in `collection`
    fn count(&self, collection: &str) -> UowResult<usize>;
}

/// Load and decode the committed entity stored under `key`
pub fn find<E: Entity, S: EntityStore + ?Sized>(store: &S, key: &[u8]) -> UowResult<Option<E>> {
    match store.get_raw(E::COLLECTION, key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

/// Number of committed entities of type `E`
pub fn count<E: Entity, S: EntityStore + ?Sized>(store: &S) -> UowResult<usize> {
    store.count(E::COLLECTION)
}

#[async_trait]
impl<E: Entity> UowObject<StagedTransaction> for E {
    async fn apply_create(&self, tx: &StagedTransaction) -> UowResult<()> {
        tx.stage(StagedWrite::Insert {
            collection: E::COLLECTION.to_string(),
            key: self.key(),
            value: bincode::serialize(self)?,
        });
        Ok(())
    }

    async fn apply_update(&self, tx: &StagedTransaction) -> UowResult<()> {
        tx.stage(StagedWrite::Update {
            collection: E::COLLECTION.to_string(),
            key: self.key(),
            value: bincode::serialize(self)?,
        });
        Ok(())
    }

    async fn apply_delete(&self, tx: &StagedTransaction) -> UowResult<()> {
        tx.stage(StagedWrite::Remove {
            collection: E::COLLECTION.to_string(),
            key: self.key(),
        });
        Ok(())
    }
}
