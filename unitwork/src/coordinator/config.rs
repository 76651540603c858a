// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Coordinator configuration

use crate::error::{UowError, UowResult};
use serde::{Deserialize, Serialize};

/// How the intents of one category are issued during a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Issue every intent of the category at once and join them
    #[default]
    Concurrent,
    /// Await intents one at a time in insertion order, stopping at the first failure
    ///
    /// For handles that cannot serve overlapping operations, such as a single
    /// database connection.
    Sequential,
}

/// Unit-of-work configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UowConfig {
    /// Name used to tag log lines of this unit of work
    pub name: String,

    /// Fan-out policy within a category
    pub fan_out: FanOut,
}

impl Default for UowConfig {
    fn default() -> Self {
        Self {
            name: "uow".to_string(),
            fan_out: FanOut::Concurrent,
        }
    }
}

impl UowConfig {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Parse and validate a JSON configuration; absent fields take their defaults
    pub fn from_json_str(json: &str) -> UowResult<Self> {
        let config: UowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> UowResult<()> {
        if self.name.trim().is_empty() {
            return Err(UowError::config("unit of work name must not be empty"));
        }
        Ok(())
    }
}
