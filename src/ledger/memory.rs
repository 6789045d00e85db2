use ahash::AHashMap as HashMap;
use parking_lot::RwLock;

use crate::errors::Result;
use crate::ledger::{CreateOutcome, Ledger, SwapOutcome};

/// In-process ledger backed by a hash map behind a read-write lock.
///
/// Every conditional operation runs under the write lock, which makes it
/// atomic with respect to all other calls. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Ledger for MemoryLedger {
    async fn create_if_absent(&self, key: &str, value: Vec<u8>) -> Result<CreateOutcome> {
        let mut data = self.data.write();
        if data.contains_key(key) {
            return Ok(CreateOutcome::Exists);
        }
        data.insert(key.to_string(), value);
        Ok(CreateOutcome::Created)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<SwapOutcome> {
        let mut data = self.data.write();
        match data.get_mut(key) {
            Some(current) if current.as_slice() == expected => {
                *current = new;
                Ok(SwapOutcome::Swapped)
            }
            _ => Ok(SwapOutcome::Conflict),
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn heartbeat(&self) -> Result<bool> {
        Ok(true)
    }
}
