// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Core traits at the boundary between the coordinator and its collaborators
//!
//! A backend implements [`TransactionAdapter`] to hand out transaction handles.
//! A queued object implements [`UowObject`] to apply itself through one.

use crate::error::UowResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Transactional resource that a unit of work flushes against
///
/// The coordinator never inspects `Tx`; it obtains one from [`begin`](Self::begin),
/// threads it through every apply call and the commit or rollback, and finally
/// gives it back through [`release`](Self::release).
#[async_trait]
pub trait TransactionAdapter: Send + Sync {
    /// Opaque transaction handle
    type Tx: Send + Sync;

    /// Open a new transaction
    async fn begin(&self) -> UowResult<Self::Tx>;

    /// Make every write performed through `tx` durable
    async fn commit(&self, tx: &Self::Tx) -> UowResult<()>;

    /// Discard every write performed through `tx`
    async fn rollback(&self, tx: &Self::Tx) -> UowResult<()>;

    /// Return the handle to the backend
    ///
    /// Backends without a notion of handle disposal keep this no-op. Backends
    /// that hold resources per handle (pooled connections, registered
    /// transactions) override it.
    async fn release(&self, _tx: Self::Tx) -> UowResult<()> {
        Ok(())
    }
}

/// An object that knows how to persist its own create, update and delete
#[async_trait]
pub trait UowObject<Tx>: Send + Sync {
    /// Write this object as a new record
    async fn apply_create(&self, tx: &Tx) -> UowResult<()>;

    /// Overwrite the existing record for this object
    async fn apply_update(&self, tx: &Tx) -> UowResult<()>;

    /// Remove the record for this object
    async fn apply_delete(&self, tx: &Tx) -> UowResult<()>;
}

#[async_trait]
impl<A> TransactionAdapter for Arc<A>
where
    A: TransactionAdapter + ?Sized,
{
    type Tx = A::Tx;

    async fn begin(&self) -> UowResult<Self::Tx> {
        (**self).begin().await
    }

    async fn commit(&self, tx: &Self::Tx) -> UowResult<()> {
        (**self).commit(tx).await
    }

    async fn rollback(&self, tx: &Self::Tx) -> UowResult<()> {
        (**self).rollback(tx).await
    }

    async fn release(&self, tx: Self::Tx) -> UowResult<()> {
        (**self).release(tx).await
    }
}
