//! The durable store that holds transaction records.
//!
//! The coordinator keeps no authoritative state of its own; every mutation
//! goes through the conditional operations of a [`Ledger`]. Values are opaque
//! bytes, so a backend only has to compare and store them.

use std::future::Future;
use std::sync::Arc;

use crate::errors::Result;

pub mod memory;
#[cfg(feature = "durable")]
pub mod rocks;

pub use memory::MemoryLedger;
#[cfg(feature = "durable")]
pub use rocks::RocksLedger;

/// Result of [`Ledger::create_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Exists,
}

/// Result of [`Ledger::compare_and_swap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Swapped,
    /// The stored value did not match the expected one (or the key is gone).
    Conflict,
}

/// Linearizable key-value store with conditional writes.
///
/// Implementations must apply each call atomically: a write is either fully
/// durable or not applied at all. All methods may suspend while talking to
/// the backend, and must be callable from many tasks at once.
pub trait Ledger: Send + Sync + 'static {
    /// Stores `value` under `key` only if the key is not present.
    fn create_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<CreateOutcome>> + Send;

    /// Replaces the value under `key` with `new` only if it currently equals
    /// `expected`.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> impl Future<Output = Result<SwapOutcome>> + Send;

    /// Reads the current value under `key`.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Liveness probe. An unreachable backend is an error, not `Ok(false)`.
    fn heartbeat(&self) -> impl Future<Output = Result<bool>> + Send;
}

impl<L: Ledger> Ledger for Arc<L> {
    fn create_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<CreateOutcome>> + Send {
        (**self).create_if_absent(key, value)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> impl Future<Output = Result<SwapOutcome>> + Send {
        (**self).compare_and_swap(key, expected, new)
    }

    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send {
        (**self).read(key)
    }

    fn heartbeat(&self) -> impl Future<Output = Result<bool>> + Send {
        (**self).heartbeat()
    }
}
