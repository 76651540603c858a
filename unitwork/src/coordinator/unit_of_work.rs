// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Unit-of-work coordinator
//!
//! Buffers create/update/delete intents and flushes them through a single
//! transaction obtained from a [`TransactionAdapter`].
//!
//! # Flush sequence
//!
//! ```text
//! Idle -> Beginning -> Applying(create) -> Applying(update) -> Applying(delete)
//!      -> Committing -> (ok | RollingBack) -> Releasing -> Idle
//! ```
//!
//! - A begin failure is returned as-is; nothing is rolled back or released
//!   and the buffered intents stay queued.
//! - Once a handle exists, any apply or commit failure triggers a rollback,
//!   the handle is always released, and the buffers and activation flag are
//!   always reset.
//! - Exactly one error reaches the caller: the apply/commit failure if there
//!   was one, otherwise a release failure. Rollback failures are logged and
//!   counted in [`FlushStatistics`] but never returned.

use super::config::{FanOut, UowConfig};
use super::state::{FlushPhase, FlushStatistics, IntentKind, PendingCounts, WorkState};
use crate::adapter::{TransactionAdapter, UowObject};
use crate::error::{UowError, UowResult};
use futures::future::{self, BoxFuture};
use std::sync::Arc;

/// Coordinator for one logical session against one transactional resource
///
/// Every operation that touches the buffers takes `&mut self`, so a single
/// instance can never be flushed from two places at once. Use one instance
/// per concurrent producer.
pub struct UnitOfWork<A: TransactionAdapter> {
    adapter: A,
    config: UowConfig,
    state: WorkState<A::Tx>,
    phase: FlushPhase,
    stats: FlushStatistics,
}

impl<A: TransactionAdapter> UnitOfWork<A> {
    /// Create a unit of work with the default configuration
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, UowConfig::default())
    }

    pub fn with_config(adapter: A, config: UowConfig) -> Self {
        Self {
            adapter,
            config,
            state: WorkState::default(),
            phase: FlushPhase::Idle,
            stats: FlushStatistics::default(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &UowConfig {
        &self.config
    }

    /// Open an explicit unit of work
    ///
    /// Intents marked afterwards are buffered until [`commit_work`](Self::commit_work).
    pub fn begin_work(&mut self) {
        self.state.active = true;
    }

    /// Flush every buffered intent in one transaction
    ///
    /// Runs even when nothing is buffered, in which case the adapter sees an
    /// empty begin/commit/release cycle.
    pub async fn commit_work(&mut self) -> UowResult<()> {
        self.flush().await
    }

    /// Queue `object` for creation
    ///
    /// Without an open unit of work this flushes immediately. If that flush
    /// fails at `begin`, the intent is not discarded: it stays queued and is
    /// applied by the next flush together with whatever is marked next.
    pub async fn mark_create<O>(&mut self, object: Arc<O>) -> UowResult<()>
    where
        O: UowObject<A::Tx> + 'static,
    {
        self.mark(IntentKind::Create, object).await
    }

    /// Queue `object` for update
    ///
    /// Without an open unit of work this flushes immediately. If that flush
    /// fails at `begin`, the intent is not discarded: it stays queued and is
    /// applied by the next flush together with whatever is marked next.
    pub async fn mark_update<O>(&mut self, object: Arc<O>) -> UowResult<()>
    where
        O: UowObject<A::Tx> + 'static,
    {
        self.mark(IntentKind::Update, object).await
    }

    /// Queue `object` for deletion
    ///
    /// Without an open unit of work this flushes immediately. If that flush
    /// fails at `begin`, the intent is not discarded: it stays queued and is
    /// applied by the next flush together with whatever is marked next.
    pub async fn mark_delete<O>(&mut self, object: Arc<O>) -> UowResult<()>
    where
        O: UowObject<A::Tx> + 'static,
    {
        self.mark(IntentKind::Delete, object).await
    }

    /// Queue an already type-erased object under `kind`
    ///
    /// Without an open unit of work this flushes immediately and returns the
    /// flush result. A begin failure leaves the intent queued for the next
    /// flush; any later failure discards it with the rest of the batch.
    pub async fn mark(
        &mut self,
        kind: IntentKind,
        object: Arc<dyn UowObject<A::Tx>>,
    ) -> UowResult<()> {
        self.state.push(kind, object);

        if self.state.active {
            log::debug!("[{}] buffered {} intent", self.config.name, kind);
            return Ok(());
        }

        self.flush().await
    }

    /// True between [`begin_work`](Self::begin_work) and the next flush
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn pending(&self) -> PendingCounts {
        self.state.counts()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending().is_empty()
    }

    /// Current flush phase; `Idle` whenever no flush is in flight
    pub fn phase(&self) -> FlushPhase {
        self.phase
    }

    pub fn statistics(&self) -> &FlushStatistics {
        &self.stats
    }

    async fn flush(&mut self) -> UowResult<()> {
        self.stats.flushes += 1;
        self.enter(FlushPhase::Beginning);

        let tx = match self.adapter.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.stats.begin_failures += 1;
                self.enter(FlushPhase::Idle);
                log::warn!("[{}] begin failed: {}", self.config.name, e);
                return Err(e);
            }
        };

        // The handle exists from here on, so the reset must happen on every path.
        let work = std::mem::take(&mut self.state);
        let counts = work.counts();

        let outcome = match self.apply_and_commit(&work, &tx).await {
            Ok(()) => {
                self.stats.committed += 1;
                Ok(())
            }
            Err(e) => {
                self.roll_back(&tx, &e).await;
                Err(e)
            }
        };

        self.enter(FlushPhase::Releasing);
        let released = self.adapter.release(tx).await;
        self.enter(FlushPhase::Idle);
        drop(work);

        match (outcome, released) {
            (Ok(()), Ok(())) => {
                log::info!(
                    "[{}] committed {} create(s), {} update(s), {} delete(s)",
                    self.config.name,
                    counts.creates,
                    counts.updates,
                    counts.deletes
                );
                Ok(())
            }
            (Ok(()), Err(release_err)) => {
                self.stats.release_failures += 1;
                log::warn!("[{}] release failed: {}", self.config.name, release_err);
                Err(release_err)
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                self.stats.release_failures += 1;
                log::warn!(
                    "[{}] release failed after earlier error: {}",
                    self.config.name,
                    release_err
                );
                Err(e)
            }
        }
    }

    async fn apply_and_commit(&mut self, work: &WorkState<A::Tx>, tx: &A::Tx) -> UowResult<()> {
        for kind in IntentKind::FLUSH_ORDER {
            self.apply_category(kind, work.intents(kind), tx).await?;
        }

        self.enter(FlushPhase::Committing);
        self.adapter.commit(tx).await
    }

    async fn apply_category(
        &mut self,
        kind: IntentKind,
        intents: &[Arc<dyn UowObject<A::Tx>>],
        tx: &A::Tx,
    ) -> UowResult<()> {
        if intents.is_empty() {
            return Ok(());
        }
        self.enter(FlushPhase::Applying(kind));

        let result = match self.config.fan_out {
            FanOut::Concurrent => {
                let settled =
                    future::join_all(intents.iter().map(|o| apply_intent(kind, o.as_ref(), tx)))
                        .await;
                // First failure in insertion order, after every intent settled.
                settled.into_iter().collect::<UowResult<Vec<()>>>().map(|_| ())
            }
            FanOut::Sequential => {
                let mut result = Ok(());
                for object in intents {
                    result = apply_intent(kind, object.as_ref(), tx).await;
                    if result.is_err() {
                        break;
                    }
                }
                result
            }
        };

        if let Err(e) = &result {
            log::debug!(
                "[{}] {} category failed ({} intent(s)): {}",
                self.config.name,
                kind,
                intents.len(),
                e
            );
        }
        result
    }

    async fn roll_back(&mut self, tx: &A::Tx, cause: &UowError) {
        self.enter(FlushPhase::RollingBack);
        self.stats.rolled_back += 1;
        log::debug!("[{}] rolling back after: {}", self.config.name, cause);

        if let Err(e) = self.adapter.rollback(tx).await {
            log::warn!(
                "[{}] rollback failed (suppressed in favour of '{}'): {}",
                self.config.name,
                cause,
                e
            );
            self.stats.suppressed_rollback_failures += 1;
            self.stats.last_rollback_failure = Some(e.to_string());
        }
    }

    fn enter(&mut self, phase: FlushPhase) {
        log::debug!("[{}] {} -> {}", self.config.name, self.phase, phase);
        self.phase = phase;
    }
}

fn apply_intent<'a, Tx>(
    kind: IntentKind,
    object: &'a dyn UowObject<Tx>,
    tx: &'a Tx,
) -> BoxFuture<'a, UowResult<()>> {
    match kind {
        IntentKind::Create => object.apply_create(tx),
        IntentKind::Update => object.apply_update(tx),
        IntentKind::Delete => object.apply_delete(tx),
    }
}

impl<A: TransactionAdapter + std::fmt::Debug> std::fmt::Debug for UnitOfWork<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("adapter", &self.adapter)
            .field("config", &self.config)
            .field("active", &self.state.active)
            .field("pending", &self.state.counts())
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Adapter whose handle is a plain number and which records its calls
    #[derive(Default)]
    struct Ledger {
        calls: Mutex<Vec<String>>,
        fail_commit: bool,
        fail_rollback: bool,
    }

    impl Ledger {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl TransactionAdapter for Ledger {
        type Tx = u32;

        async fn begin(&self) -> UowResult<u32> {
            self.calls.lock().push("begin".into());
            Ok(7)
        }

        async fn commit(&self, tx: &u32) -> UowResult<()> {
            self.calls.lock().push(format!("commit {}", tx));
            if self.fail_commit {
                return Err(UowError::commit("rejected"));
            }
            Ok(())
        }

        async fn rollback(&self, tx: &u32) -> UowResult<()> {
            self.calls.lock().push(format!("rollback {}", tx));
            if self.fail_rollback {
                return Err(UowError::rollback("connection lost"));
            }
            Ok(())
        }
    }

    struct Row;

    #[async_trait]
    impl UowObject<u32> for Row {
        async fn apply_create(&self, _tx: &u32) -> UowResult<()> {
            Ok(())
        }
        async fn apply_update(&self, _tx: &u32) -> UowResult<()> {
            Ok(())
        }
        async fn apply_delete(&self, _tx: &u32) -> UowResult<()> {
            Err(UowError::apply(IntentKind::Delete, "still referenced"))
        }
    }

    #[tokio::test]
    async fn test_empty_commit_runs_full_cycle() {
        let mut uow = UnitOfWork::new(Ledger::default());
        uow.commit_work().await.unwrap();

        assert_eq!(uow.adapter().calls(), vec!["begin", "commit 7"]);
        assert_eq!(uow.statistics().committed, 1);
        assert_eq!(uow.phase(), FlushPhase::Idle);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let ledger = Ledger {
            fail_commit: true,
            ..Default::default()
        };
        let mut uow = UnitOfWork::new(ledger);
        let err = uow.mark_create(Arc::new(Row)).await.unwrap_err();

        assert!(matches!(err, UowError::Commit(_)));
        assert_eq!(
            uow.adapter().calls(),
            vec!["begin", "commit 7", "rollback 7"]
        );
        assert_eq!(uow.statistics().rolled_back, 1);
    }

    #[tokio::test]
    async fn test_rollback_failure_is_recorded_not_returned() {
        let ledger = Ledger {
            fail_rollback: true,
            ..Default::default()
        };
        let mut uow = UnitOfWork::new(ledger);
        let err = uow.mark_delete(Arc::new(Row)).await.unwrap_err();

        assert!(matches!(
            err,
            UowError::Apply {
                kind: IntentKind::Delete,
                ..
            }
        ));
        let stats = uow.statistics();
        assert_eq!(stats.suppressed_rollback_failures, 1);
        assert!(stats
            .last_rollback_failure
            .as_deref()
            .unwrap()
            .contains("connection lost"));
        assert!(!uow.has_pending());
    }

    #[tokio::test]
    async fn test_begin_work_buffers() {
        let mut uow = UnitOfWork::new(Ledger::default());
        uow.begin_work();
        uow.mark_create(Arc::new(Row)).await.unwrap();
        uow.mark_update(Arc::new(Row)).await.unwrap();

        assert!(uow.is_active());
        assert_eq!(uow.pending().total(), 2);
        assert!(uow.adapter().calls().is_empty());
    }
}
