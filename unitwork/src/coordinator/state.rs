// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pending work state and flush lifecycle types
//!
//! [`WorkState`] is the only mutable state a unit of work owns. It is swapped
//! out for a fresh value whenever a flush takes ownership of the buffered
//! intents, so no stale intent or activation survives a flush.

use crate::adapter::UowObject;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Category of a pending intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    Create,
    Update,
    Delete,
}

impl IntentKind {
    /// Categories in the order a flush applies them
    pub const FLUSH_ORDER: [IntentKind; 3] =
        [IntentKind::Create, IntentKind::Update, IntentKind::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Create => "create",
            IntentKind::Update => "update",
            IntentKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Step of the flush state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlushPhase {
    /// No flush in flight
    Idle,
    /// Waiting for the adapter to hand out a transaction
    Beginning,
    /// Applying one category of intents
    Applying(IntentKind),
    /// Waiting for the adapter to commit
    Committing,
    /// An apply or the commit failed; asking the adapter to roll back
    RollingBack,
    /// Returning the transaction handle to the adapter
    Releasing,
}

impl std::fmt::Display for FlushPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushPhase::Idle => write!(f, "idle"),
            FlushPhase::Beginning => write!(f, "beginning"),
            FlushPhase::Applying(kind) => write!(f, "applying {}s", kind),
            FlushPhase::Committing => write!(f, "committing"),
            FlushPhase::RollingBack => write!(f, "rolling back"),
            FlushPhase::Releasing => write!(f, "releasing"),
        }
    }
}

/// Buffered intents plus the activation flag
pub struct WorkState<Tx> {
    pub(crate) creates: Vec<Arc<dyn UowObject<Tx>>>,
    pub(crate) updates: Vec<Arc<dyn UowObject<Tx>>>,
    pub(crate) deletes: Vec<Arc<dyn UowObject<Tx>>>,
    pub(crate) active: bool,
}

impl<Tx> WorkState<Tx> {
    pub(crate) fn push(&mut self, kind: IntentKind, object: Arc<dyn UowObject<Tx>>) {
        match kind {
            IntentKind::Create => self.creates.push(object),
            IntentKind::Update => self.updates.push(object),
            IntentKind::Delete => self.deletes.push(object),
        }
    }

    pub(crate) fn intents(&self, kind: IntentKind) -> &[Arc<dyn UowObject<Tx>>] {
        match kind {
            IntentKind::Create => &self.creates,
            IntentKind::Update => &self.updates,
            IntentKind::Delete => &self.deletes,
        }
    }

    pub fn counts(&self) -> PendingCounts {
        PendingCounts {
            creates: self.creates.len(),
            updates: self.updates.len(),
            deletes: self.deletes.len(),
        }
    }
}

impl<Tx> Default for WorkState<Tx> {
    fn default() -> Self {
        Self {
            creates: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
            active: false,
        }
    }
}

/// Snapshot of how many intents are buffered per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCounts {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl PendingCounts {
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Flush statistics for monitoring
///
/// Rollback failures never reach the caller; they are counted here and the
/// most recent one is kept for inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlushStatistics {
    pub flushes: u64,
    pub committed: u64,
    pub rolled_back: u64,
    pub begin_failures: u64,
    pub release_failures: u64,
    pub suppressed_rollback_failures: u64,
    pub last_rollback_failure: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UowResult;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl UowObject<()> for Noop {
        async fn apply_create(&self, _tx: &()) -> UowResult<()> {
            Ok(())
        }
        async fn apply_update(&self, _tx: &()) -> UowResult<()> {
            Ok(())
        }
        async fn apply_delete(&self, _tx: &()) -> UowResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_push_routes_by_kind() {
        let mut state: WorkState<()> = WorkState::default();
        state.push(IntentKind::Create, Arc::new(Noop));
        state.push(IntentKind::Delete, Arc::new(Noop));
        state.push(IntentKind::Delete, Arc::new(Noop));

        let counts = state.counts();
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.updates, 0);
        assert_eq!(counts.deletes, 2);
        assert_eq!(counts.total(), 3);
        assert_eq!(state.intents(IntentKind::Delete).len(), 2);
    }

    #[test]
    fn test_take_leaves_fresh_state() {
        let mut state: WorkState<()> = WorkState::default();
        state.active = true;
        state.push(IntentKind::Update, Arc::new(Noop));

        let taken = std::mem::take(&mut state);
        assert!(taken.active);
        assert_eq!(taken.counts().updates, 1);
        assert!(!state.active);
        assert!(state.counts().is_empty());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(
            FlushPhase::Applying(IntentKind::Create).to_string(),
            "applying creates"
        );
        assert_eq!(FlushPhase::RollingBack.to_string(), "rolling back");
    }
}
