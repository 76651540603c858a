// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Typed repository on top of a unit of work
//!
//! A [`Repository`] binds one [`Entity`] type to a unit of work over a shared
//! [`StagedAdapter`] and exposes create/update/delete in entity terms.
//!
//! # Examples
//!
//! ```ignore
//! let adapter = Arc::new(MemoryAdapter::new());
//! let mut users: Repository<MemoryAdapter, User> = Repository::new(adapter);
//!
//! users.begin_work();
//! users.create(alice).await?;
//! users.delete(bob).await?;
//! users.commit_work().await?; // one transaction
//! ```

use crate::adapter::StagedAdapter;
use crate::coordinator::{PendingCounts, UnitOfWork, UowConfig};
use crate::entity::{self, Entity};
use crate::error::UowResult;
use std::marker::PhantomData;
use std::sync::Arc;

/// Unit of work restricted to one entity type
pub struct Repository<S, E>
where
    S: StagedAdapter + ?Sized,
    E: Entity,
{
    uow: UnitOfWork<Arc<S>>,
    _entity: PhantomData<fn() -> E>,
}

impl<S, E> Repository<S, E>
where
    S: StagedAdapter + ?Sized,
    E: Entity,
{
    pub fn new(adapter: Arc<S>) -> Self {
        Self::with_config(adapter, UowConfig::named(E::COLLECTION))
    }

    pub fn with_config(adapter: Arc<S>, config: UowConfig) -> Self {
        Self {
            uow: UnitOfWork::with_config(adapter, config),
            _entity: PhantomData,
        }
    }

    /// Buffer subsequent writes until [`commit_work`](Self::commit_work)
    pub fn begin_work(&mut self) {
        self.uow.begin_work();
    }

    pub async fn commit_work(&mut self) -> UowResult<()> {
        self.uow.commit_work().await
    }

    pub async fn create(&mut self, entity: impl Into<Arc<E>>) -> UowResult<()> {
        self.uow.mark_create(entity.into()).await
    }

    pub async fn update(&mut self, entity: impl Into<Arc<E>>) -> UowResult<()> {
        self.uow.mark_update(entity.into()).await
    }

    pub async fn delete(&mut self, entity: impl Into<Arc<E>>) -> UowResult<()> {
        self.uow.mark_delete(entity.into()).await
    }

    /// Committed entity stored under `key`; buffered writes are not visible
    pub fn find(&self, key: &[u8]) -> UowResult<Option<E>> {
        entity::find::<E, S>(&**self.uow.adapter(), key)
    }

    /// Number of committed entities
    pub fn count(&self) -> UowResult<usize> {
        entity::count::<E, S>(&**self.uow.adapter())
    }

    pub fn pending(&self) -> PendingCounts {
        self.uow.pending()
    }

    pub fn unit_of_work(&self) -> &UnitOfWork<Arc<S>> {
        &self.uow
    }
}
