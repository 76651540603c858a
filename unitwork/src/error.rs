// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the unit-of-work coordinator and its adapters

use crate::coordinator::IntentKind;
use thiserror::Error;

/// Errors that can occur while queueing or flushing a unit of work
#[derive(Error, Debug)]
pub enum UowError {
    #[error("Failed to begin transaction: {0}")]
    Begin(String),

    #[error("Failed to apply {kind}: {message}")]
    Apply { kind: IntentKind, message: String },

    #[error("Failed to commit transaction: {0}")]
    Commit(String),

    #[error("Failed to roll back transaction: {0}")]
    Rollback(String),

    #[error("Failed to release transaction: {0}")]
    Release(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UowError {
    /// Create a begin error
    pub fn begin<S: Into<String>>(msg: S) -> Self {
        Self::Begin(msg.into())
    }

    /// Create an apply error for the given intent category
    pub fn apply<S: Into<String>>(kind: IntentKind, msg: S) -> Self {
        Self::Apply {
            kind,
            message: msg.into(),
        }
    }

    /// Create a commit error
    pub fn commit<S: Into<String>>(msg: S) -> Self {
        Self::Commit(msg.into())
    }

    /// Create a rollback error
    pub fn rollback<S: Into<String>>(msg: S) -> Self {
        Self::Rollback(msg.into())
    }

    /// Create a release error
    pub fn release<S: Into<String>>(msg: S) -> Self {
        Self::Release(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// True for errors raised by commit-time constraint validation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::NotFound(_))
    }
}

#[cfg(feature = "sled-backend")]
impl From<sled::Error> for UowError {
    fn from(e: sled::Error) -> Self {
        UowError::Storage(e.to_string())
    }
}

/// Result type used throughout the crate
pub type UowResult<T> = Result<T, UowError>;
