use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Port the adapter service listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 50051;

/// Which ledger backend holds the transaction records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum LedgerBackend {
    /// Process-local map. Records are lost on restart.
    Memory,
    /// RocksDB database at the given path (requires the `durable` feature).
    Rocks { path: PathBuf },
}

/// Bounded retry of conditional ledger writes that lost a race.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles on each further retry.
    pub backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 16,
            backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(100),
        }
    }
}

/// Everything the coordinator process needs at startup.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CoordinatorConfig {
    pub listen_addr: SocketAddr,
    pub ledger: LedgerBackend,
    pub retry: RetryPolicy,
    /// Voting window applied when `StartVoting` carries no timeout.
    pub default_vote_timeout: Duration,
    /// Server-side deadline for a single RPC. `None` disables it.
    pub request_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            ledger: LedgerBackend::Memory,
            retry: RetryPolicy::default(),
            default_vote_timeout: Duration::from_secs(60),
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}
