// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Adapter types and configuration
//!
//! This module defines the adapter selection enum, the per-adapter
//! configuration and the call bookkeeping used by the bundled adapters.

use crate::error::{UowError, UowResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Adapter type configuration
///
/// Specifies which bundled backend a unit of work flushes against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    /// Memory - process-local map
    /// Best for: Unit testing, development
    #[default]
    Memory,

    /// Sled - Pure Rust embedded database
    /// Best for: Durable single-process storage
    Sled,
}

impl std::str::FromStr for AdapterType {
    type Err = UowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(AdapterType::Memory),
            "sled" => Ok(AdapterType::Sled),
            _ => Err(UowError::config(format!(
                "Unknown adapter type: {}. Valid options: memory, sled",
                s
            ))),
        }
    }
}

impl std::fmt::Display for AdapterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AdapterType::Memory => "memory",
            AdapterType::Sled => "sled",
        };
        write!(f, "{}", name)
    }
}

/// The four adapter operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterOp {
    Begin,
    Commit,
    Rollback,
    Release,
}

impl AdapterOp {
    /// Error an injected fault for this operation surfaces as
    pub(crate) fn injected_failure(&self) -> UowError {
        match self {
            AdapterOp::Begin => UowError::begin("injected fault"),
            AdapterOp::Commit => UowError::commit("injected fault"),
            AdapterOp::Rollback => UowError::rollback("injected fault"),
            AdapterOp::Release => UowError::release("injected fault"),
        }
    }
}

/// Number of calls an adapter received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterCallCounts {
    pub begin: u64,
    pub commit: u64,
    pub rollback: u64,
    pub release: u64,
}

impl AdapterCallCounts {
    pub(crate) fn record(&mut self, op: AdapterOp) {
        match op {
            AdapterOp::Begin => self.begin += 1,
            AdapterOp::Commit => self.commit += 1,
            AdapterOp::Rollback => self.rollback += 1,
            AdapterOp::Release => self.release += 1,
        }
    }
}

/// Sled adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SledAdapterConfig {
    /// Database directory; ignored when `temporary` is set
    pub path: Option<PathBuf>,

    /// Tree holding every collection
    pub tree_name: String,

    /// Flush the database to disk after every commit
    pub flush_on_commit: bool,

    /// Open a throwaway database removed on drop
    pub temporary: bool,
}

impl Default for SledAdapterConfig {
    fn default() -> Self {
        Self {
            path: None,
            tree_name: "unitwork".to_string(),
            flush_on_commit: true,
            temporary: false,
        }
    }
}

impl SledAdapterConfig {
    /// Configuration for a database at `path`
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Configuration for a temporary database
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            flush_on_commit: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> UowResult<()> {
        if self.tree_name.is_empty() {
            return Err(UowError::config("sled tree name must not be empty"));
        }
        if !self.temporary && self.path.is_none() {
            return Err(UowError::config(
                "sled adapter needs a path unless it is temporary",
            ));
        }
        Ok(())
    }
}

/// Backend selection plus backend-specific settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub adapter_type: AdapterType,
    pub sled: SledAdapterConfig,
}

impl AdapterConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn sled(config: SledAdapterConfig) -> Self {
        Self {
            adapter_type: AdapterType::Sled,
            sled: config,
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> UowResult<Self> {
        let config: AdapterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> UowResult<()> {
        match self.adapter_type {
            AdapterType::Memory => Ok(()),
            AdapterType::Sled => self.sled.validate(),
        }
    }
}
