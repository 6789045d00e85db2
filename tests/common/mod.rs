//! Common utilities for Verdict integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use verdict::{
    Clock, Coordinator, CreateOutcome, Ledger, MemoryLedger, Result, RetryPolicy, SwapOutcome,
    VerdictError,
};

/// A fixed start time well inside the representable range.
pub const T0: i64 = 1_700_000_000;

// --- ManualClock ---

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// --- FlakyLedger ---

/// Wraps a `MemoryLedger` and injects conflicts or outages on demand.
/// Also counts how often the backend was contacted.
#[derive(Debug, Default)]
pub struct FlakyLedger {
    inner: MemoryLedger,
    conflicts: AtomicU32,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` conditional writes report a conflict.
    pub fn inject_conflicts(&self, n: u32) {
        self.conflicts.store(n, Ordering::SeqCst);
    }

    pub fn remaining_conflicts(&self) -> u32 {
        self.conflicts.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VerdictError::Unavailable("ledger is down".to_string()));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Ledger for FlakyLedger {
    async fn create_if_absent(&self, key: &str, value: Vec<u8>) -> Result<CreateOutcome> {
        self.enter()?;
        if self.take_conflict() {
            return Err(VerdictError::Conflict("injected".to_string()));
        }
        self.inner.create_if_absent(key, value).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<SwapOutcome> {
        self.enter()?;
        if self.take_conflict() {
            return Ok(SwapOutcome::Conflict);
        }
        self.inner.compare_and_swap(key, expected, new).await
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.enter()?;
        self.inner.read(key).await
    }

    async fn heartbeat(&self) -> Result<bool> {
        self.enter()?;
        self.inner.heartbeat().await
    }
}

// --- Helper Functions ---

/// Retry policy with tiny delays so conflict tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

/// Helper function to create a coordinator over a fresh in-memory ledger and
/// a manual clock set to `T0`.
pub fn setup_coordinator() -> (Arc<Coordinator<MemoryLedger>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let coordinator = Coordinator::with_clock(
        Arc::new(MemoryLedger::new()),
        fast_retry(64),
        clock.clone(),
    );
    (Arc::new(coordinator), clock)
}

/// Helper function to create a coordinator over a `FlakyLedger`.
pub fn setup_flaky_coordinator(
    max_attempts: u32,
) -> (Arc<Coordinator<FlakyLedger>>, Arc<FlakyLedger>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let ledger = Arc::new(FlakyLedger::new());
    let coordinator =
        Coordinator::with_clock(ledger.clone(), fast_retry(max_attempts), clock.clone());
    (Arc::new(coordinator), ledger, clock)
}
