// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Unit-of-work coordination
//!
//! - [`UnitOfWork`] - buffers intents and runs the flush state machine
//! - [`WorkState`] - the buffers and activation flag a flush resets
//! - [`UowConfig`] - naming and fan-out policy

pub mod config;
pub mod state;
pub mod unit_of_work;

pub use config::{FanOut, UowConfig};
pub use state::{FlushPhase, FlushStatistics, IntentKind, PendingCounts, WorkState};
pub use unit_of_work::UnitOfWork;
