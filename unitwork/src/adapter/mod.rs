// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transactional-resource adapters
//!
//! - [`TransactionAdapter`] / [`UowObject`] - the contracts a backend and a
//!   queued object implement
//! - [`StagedTransaction`] - write-staging handle used by the bundled adapters
//! - [`MemoryAdapter`] - in-memory reference adapter
//! - [`SledAdapter`] - persistent adapter (feature `sled-backend`)

pub mod factory;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod staged;
pub mod traits;
pub mod types;

pub use factory::create_adapter;
pub use memory::MemoryAdapter;
#[cfg(feature = "sled-backend")]
pub use self::sled::SledAdapter;
pub use staged::{StagedTransaction, StagedWrite, TransactionId};
pub use traits::{TransactionAdapter, UowObject};
pub use types::{AdapterCallCounts, AdapterConfig, AdapterOp, AdapterType, SledAdapterConfig};

use crate::entity::EntityStore;

/// Adapter handing out [`StagedTransaction`]s whose committed data can be read back
///
/// Implemented automatically for every such adapter; this is what
/// [`Repository`](crate::Repository) and [`create_adapter`] work with.
pub trait StagedAdapter: TransactionAdapter<Tx = StagedTransaction> + EntityStore {}

impl<T> StagedAdapter for T where T: TransactionAdapter<Tx = StagedTransaction> + EntityStore {}
