//! Recording adapter and queued object
//!
//! Both write into a shared [`EventLog`] so tests can assert on the exact
//! interleaving of adapter calls and apply calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use unitwork::{IntentKind, TransactionAdapter, UowError, UowObject, UowResult};

/// Ordered list of events plus an in-flight gauge for apply calls
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push<S: Into<String>>(&self, event: S) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Index of the first event equal to `event`
    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    /// Number of events starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Highest number of apply calls observed running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transaction handle handed out by [`RecordingAdapter`]
#[derive(Debug)]
pub struct TestTx {
    pub id: u64,
}

/// Adapter that logs `begin tx<N>`, `commit tx<N>`, `rollback tx<N>`, `release tx<N>`
#[derive(Default)]
pub struct RecordingAdapter {
    log: Arc<EventLog>,
    next_id: AtomicU64,
    pub fail_begin: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_rollback: AtomicBool,
    pub fail_release: AtomicBool,
}

impl RecordingAdapter {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn heal(flag: &AtomicBool) {
        flag.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionAdapter for RecordingAdapter {
    type Tx = TestTx;

    async fn begin(&self) -> UowResult<TestTx> {
        if self.fail_begin.load(Ordering::SeqCst) {
            self.log.push("begin failed");
            return Err(UowError::begin("pool exhausted"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.push(format!("begin tx{}", id));
        Ok(TestTx { id })
    }

    async fn commit(&self, tx: &TestTx) -> UowResult<()> {
        self.log.push(format!("commit tx{}", tx.id));
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(UowError::commit("serialization conflict"));
        }
        Ok(())
    }

    async fn rollback(&self, tx: &TestTx) -> UowResult<()> {
        self.log.push(format!("rollback tx{}", tx.id));
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(UowError::rollback("connection reset"));
        }
        Ok(())
    }

    async fn release(&self, tx: TestTx) -> UowResult<()> {
        self.log.push(format!("release tx{}", tx.id));
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(UowError::release("pool closed"));
        }
        Ok(())
    }
}

/// Queued object that logs `start <kind> <name>` and `end <kind> <name>`
pub struct RecordingObject {
    name: String,
    log: Arc<EventLog>,
    delay: Duration,
    fail_on: Option<IntentKind>,
    seen: Mutex<Vec<(IntentKind, u64)>>,
}

impl RecordingObject {
    pub fn new(name: &str, log: &Arc<EventLog>) -> Arc<Self> {
        Self::build(name, log, Duration::ZERO, None)
    }

    /// Object whose apply calls take `delay` to settle
    pub fn slow(name: &str, log: &Arc<EventLog>, delay: Duration) -> Arc<Self> {
        Self::build(name, log, delay, None)
    }

    /// Object whose apply fails for `kind`
    pub fn failing(name: &str, log: &Arc<EventLog>, kind: IntentKind) -> Arc<Self> {
        Self::build(name, log, Duration::ZERO, Some(kind))
    }

    fn build(
        name: &str,
        log: &Arc<EventLog>,
        delay: Duration,
        fail_on: Option<IntentKind>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            delay,
            fail_on,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Every (kind, transaction id) this object was applied with
    pub fn seen(&self) -> Vec<(IntentKind, u64)> {
        self.seen.lock().clone()
    }

    pub fn calls(&self, kind: IntentKind) -> usize {
        self.seen.lock().iter().filter(|(k, _)| *k == kind).count()
    }

    async fn apply(&self, kind: IntentKind, tx: &TestTx) -> UowResult<()> {
        self.seen.lock().push((kind, tx.id));
        self.log.enter();
        self.log.push(format!("start {} {}", kind, self.name));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.log.push(format!("end {} {}", kind, self.name));
        self.log.exit();

        if self.fail_on == Some(kind) {
            return Err(UowError::apply(kind, format!("{} rejected", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl UowObject<TestTx> for RecordingObject {
    async fn apply_create(&self, tx: &TestTx) -> UowResult<()> {
        self.apply(IntentKind::Create, tx).await
    }

    async fn apply_update(&self, tx: &TestTx) -> UowResult<()> {
        self.apply(IntentKind::Update, tx).await
    }

    async fn apply_delete(&self, tx: &TestTx) -> UowResult<()> {
        self.apply(IntentKind::Delete, tx).await
    }
}
