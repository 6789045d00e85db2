use log::{debug, warn};
use rocksdb::{ErrorKind, Options, TransactionDB, TransactionDBOptions};
use std::path::Path;
use std::sync::Arc;

use crate::errors::{Result, VerdictError};
use crate::ledger::{CreateOutcome, Ledger, SwapOutcome};

const HEARTBEAT_KEY: &[u8] = b"__verdict_heartbeat__";

/// Durable ledger stored in a RocksDB `TransactionDB`.
///
/// Conditional writes take a pessimistic row lock with `get_for_update`,
/// compare, write and commit inside one RocksDB transaction. Lock waits that
/// time out and commit-time busy errors are reported as
/// [`VerdictError::Conflict`] so the coordinator retries them.
///
/// RocksDB calls block, so each operation runs on the blocking thread pool.
pub struct RocksLedger {
    db: Arc<TransactionDB>,
}

impl RocksLedger {
    /// Opens (or creates) a ledger database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VerdictError::Storage`] if RocksDB cannot open the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let txn_db_opts = TransactionDBOptions::default();
        let db = TransactionDB::open(&opts, &txn_db_opts, path.as_ref()).map_err(storage_error)?;
        debug!("Opened RocksDB ledger at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&TransactionDB) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| VerdictError::Storage(format!("ledger task failed: {e}")))?
    }
}

fn storage_error(e: rocksdb::Error) -> VerdictError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TryAgain | ErrorKind::TimedOut => {
            VerdictError::Conflict(e.to_string())
        }
        ErrorKind::ShutdownInProgress | ErrorKind::IOError => {
            warn!("RocksDB ledger unavailable: {}", e);
            VerdictError::Unavailable(e.to_string())
        }
        _ => VerdictError::Storage(e.to_string()),
    }
}

impl Ledger for RocksLedger {
    async fn create_if_absent(&self, key: &str, value: Vec<u8>) -> Result<CreateOutcome> {
        let key = key.as_bytes().to_vec();
        self.run_blocking(move |db| {
            let txn = db.transaction();
            if txn.get_for_update(&key, true).map_err(storage_error)?.is_some() {
                txn.rollback().map_err(storage_error)?;
                return Ok(CreateOutcome::Exists);
            }
            txn.put(&key, value).map_err(storage_error)?;
            txn.commit().map_err(storage_error)?;
            Ok(CreateOutcome::Created)
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<SwapOutcome> {
        let key = key.as_bytes().to_vec();
        let expected = expected.to_vec();
        self.run_blocking(move |db| {
            let txn = db.transaction();
            let current = txn.get_for_update(&key, true).map_err(storage_error)?;
            if current.as_deref() != Some(expected.as_slice()) {
                txn.rollback().map_err(storage_error)?;
                return Ok(SwapOutcome::Conflict);
            }
            txn.put(&key, new).map_err(storage_error)?;
            txn.commit().map_err(storage_error)?;
            Ok(SwapOutcome::Swapped)
        })
        .await
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.as_bytes().to_vec();
        self.run_blocking(move |db| db.get(&key).map_err(storage_error)).await
    }

    async fn heartbeat(&self) -> Result<bool> {
        self.run_blocking(|db| {
            db.get(HEARTBEAT_KEY).map_err(storage_error)?;
            Ok(true)
        })
        .await
    }
}
