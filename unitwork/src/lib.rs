// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! unitwork - A backend-agnostic Unit-of-Work coordinator
//!
//! Callers queue create/update/delete intents against arbitrary objects and
//! commit them later as one atomic transaction against a single
//! transactional resource.
//!
//! # Features
//!
//! - **Explicit or autocommit**: buffer intents after `begin_work()`, or flush on every mark
//! - **Fixed ordering**: creates, then updates, then deletes; each category fanned out concurrently
//! - **Atomic flush**: any apply or commit failure rolls the whole transaction back
//! - **Pluggable backends**: anything implementing [`TransactionAdapter`]
//! - **Bundled adapters**: in-memory and Sled, plus a typed [`Repository`]
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use unitwork::{MemoryAdapter, UnitOfWork};
//!
//! let mut uow = UnitOfWork::new(Arc::new(MemoryAdapter::new()));
//! uow.begin_work();
//! uow.mark_create(Arc::new(order)).await?;
//! uow.mark_update(Arc::new(stock)).await?;
//! uow.commit_work().await?;
//! ```
//!
//! # Module Organization
//!
//! - [`coordinator`] - the unit of work and its flush state machine
//! - [`adapter`] - backend contracts and the bundled adapters
//! - [`entity`] - serializable entities and committed-data reads
//! - [`repository`] - typed facade over a unit of work
//! - [`error`] - error types

pub mod adapter;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod repository;

pub use adapter::{
    create_adapter, AdapterConfig, AdapterType, MemoryAdapter, SledAdapterConfig, StagedAdapter,
    StagedTransaction, TransactionAdapter, UowObject,
};
#[cfg(feature = "sled-backend")]
pub use adapter::SledAdapter;
pub use coordinator::{FanOut, FlushStatistics, IntentKind, UnitOfWork, UowConfig};
pub use entity::{Entity, EntityStore};
pub use error::{UowError, UowResult};
pub use repository::Repository;

/// unitwork version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
