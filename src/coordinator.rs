use log::{debug, info, warn};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::RetryPolicy;
use crate::decision::{Ballot, Decision};
use crate::errors::{Result, VerdictError};
use crate::ledger::{CreateOutcome, Ledger, SwapOutcome};
use crate::record::{CohortId, TransactionRecord, VoteEffect};

/// The two-phase-commit vote coordinator.
///
/// `Coordinator` registers transactions, applies cohort votes and resolves
/// decisions against a [`Ledger`]. It holds no transaction state itself:
/// every registration and vote is a conditional write on the ledger, retried
/// on conflict, so any number of calls can run concurrently on the same or
/// different transactions. Records are independent and never locked across
/// transactions.
///
/// Deadlines are evaluated lazily. Nothing runs in the background; a
/// transaction times out the moment a read or a vote observes that its
/// deadline has passed. A transaction nobody asks about stays pending in the
/// ledger forever.
pub struct Coordinator<L: Ledger> {
    /// Source of truth for all transaction records.
    ledger: Arc<L>,
    /// Time source for deadline checks.
    clock: Arc<dyn Clock>,
    /// Budget for retrying conflicting conditional writes.
    retry: RetryPolicy,
}

impl<L: Ledger> Coordinator<L> {
    /// Creates a coordinator using the system clock.
    pub fn new(ledger: Arc<L>, retry: RetryPolicy) -> Self {
        Self::with_clock(ledger, retry, Arc::new(SystemClock))
    }

    /// Creates a coordinator with an explicit time source.
    pub fn with_clock(ledger: Arc<L>, retry: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            clock,
            retry,
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Current time in seconds, as seen by this coordinator.
    pub fn now_secs(&self) -> i64 {
        self.clock.now_secs()
    }

    /// Registers a new transaction expecting `cohort_count` votes before
    /// `deadline` (seconds since the Unix epoch).
    ///
    /// Registration is create-only. The deadline may already be in the past,
    /// in which case the transaction resolves to a timeout abort unless a
    /// decision is reached by the votes alone.
    ///
    /// # Errors
    ///
    /// * [`VerdictError::InvalidArgument`] if the id is empty or
    ///   `cohort_count < 1`. The ledger is not contacted.
    /// * [`VerdictError::AlreadyExists`] if the id is already registered.
    /// * [`VerdictError::Unavailable`] if the ledger cannot be reached or the
    ///   write keeps conflicting.
    pub async fn start_voting(
        &self,
        transaction_id: &str,
        cohort_count: i32,
        deadline: i64,
    ) -> Result<()> {
        validate_transaction_id(transaction_id)?;
        if cohort_count < 1 {
            return Err(VerdictError::InvalidArgument(format!(
                "cohort count must be positive, got {cohort_count}"
            )));
        }

        let record = TransactionRecord::new(cohort_count as u32, deadline);
        let bytes = record.to_bytes()?;

        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.ledger.create_if_absent(transaction_id, bytes.clone()).await {
                Ok(CreateOutcome::Created) => {
                    info!(
                        "Started voting for transaction {} ({} cohorts, deadline {})",
                        transaction_id, cohort_count, deadline
                    );
                    return Ok(());
                }
                Ok(CreateOutcome::Exists) => {
                    return Err(VerdictError::AlreadyExists(format!(
                        "transaction {transaction_id} is already registered"
                    )));
                }
                Err(VerdictError::Conflict(reason)) => {
                    debug!(
                        "Registration of {} conflicted on attempt {}: {}",
                        transaction_id, attempt, reason
                    );
                    self.back_off(attempt, max_attempts).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(self.exhausted("start voting", transaction_id))
    }

    /// Records `ballot` from `cohort_id`, replacing that cohort's earlier
    /// ballot if there was one.
    ///
    /// Returns once the ballot is durable. A ballot cast after a commit quorum
    /// was reached, after the outcome has been observed as terminal, or after
    /// the deadline, is recorded but reported as [`VoteEffect::Ignored`] and
    /// never changes the outcome.
    ///
    /// # Errors
    ///
    /// * [`VerdictError::InvalidArgument`] for an empty id or a cohort id
    ///   outside `[0, cohort_count)`. The record is left unchanged.
    /// * [`VerdictError::NotFound`] if the transaction is not registered.
    /// * [`VerdictError::Unavailable`] if the ledger cannot be reached or the
    ///   retry budget is spent.
    pub async fn vote(
        &self,
        transaction_id: &str,
        cohort_id: i32,
        ballot: Ballot,
    ) -> Result<VoteEffect> {
        validate_transaction_id(transaction_id)?;
        let cohort_id: CohortId = u32::try_from(cohort_id).map_err(|_| {
            VerdictError::InvalidArgument(format!(
                "cohort id must not be negative, got {cohort_id}"
            ))
        })?;

        let effect = self
            .update(transaction_id, "vote", |record| {
                record.apply_vote(cohort_id, ballot, self.clock.now_secs())
            })
            .await?;
        debug!(
            "Recorded vote {} from cohort {} on {} ({:?})",
            ballot, cohort_id, transaction_id, effect
        );
        Ok(effect)
    }

    /// Resolves the current decision for a transaction.
    ///
    /// A `Pending` answer can later become `Commit` or `Abort`. The first
    /// call that resolves a terminal answer freezes it in the ledger before
    /// returning it, so once `Commit` or `Abort` has been reported it never
    /// changes, whatever votes arrive afterwards.
    ///
    /// # Errors
    ///
    /// * [`VerdictError::NotFound`] if the transaction is not registered.
    /// * [`VerdictError::Unavailable`] if the ledger cannot be reached, or a
    ///   terminal answer could not be frozen within the retry budget.
    pub async fn get_voting_decision(&self, transaction_id: &str) -> Result<Decision> {
        validate_transaction_id(transaction_id)?;
        let decision = self
            .update(transaction_id, "resolve decision", |record| {
                Ok(record.settle(self.clock.now_secs()).0)
            })
            .await?;
        debug!("Decision for {}: {}", transaction_id, decision);
        Ok(decision)
    }

    /// Reads the stored record for a transaction.
    pub async fn read_record(&self, transaction_id: &str) -> Result<TransactionRecord> {
        let bytes = self.read_raw(transaction_id).await?;
        TransactionRecord::from_bytes(&bytes)
    }

    /// Liveness of the underlying ledger.
    ///
    /// # Errors
    ///
    /// Any failure to reach the ledger is reported as
    /// [`VerdictError::Unavailable`].
    pub async fn get_heart_beat(&self) -> Result<bool> {
        self.ledger.heartbeat().await.map_err(|e| match e {
            VerdictError::Unavailable(m) => VerdictError::Unavailable(m),
            other => {
                warn!("Ledger heartbeat failed: {}", other);
                VerdictError::Unavailable(other.to_string())
            }
        })
    }

    async fn read_raw(&self, transaction_id: &str) -> Result<Vec<u8>> {
        self.ledger
            .read(transaction_id)
            .await?
            .ok_or_else(|| {
                VerdictError::NotFound(format!("transaction {transaction_id} is not registered"))
            })
    }

    /// Read-modify-write of one record with compare-and-swap.
    ///
    /// `apply` runs against a fresh copy of the record on every attempt. If it
    /// leaves the record unchanged nothing is written. A lost swap is retried
    /// with backoff until the retry budget is spent.
    async fn update<T, F>(&self, transaction_id: &str, operation: &str, mut apply: F) -> Result<T>
    where
        F: FnMut(&mut TransactionRecord) -> Result<T>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let current = self.read_raw(transaction_id).await?;
            let mut record = TransactionRecord::from_bytes(&current)?;
            let output = apply(&mut record)?;
            let updated = record.to_bytes()?;
            if updated == current {
                return Ok(output);
            }

            match self.ledger.compare_and_swap(transaction_id, &current, updated).await {
                Ok(SwapOutcome::Swapped) => return Ok(output),
                Ok(SwapOutcome::Conflict) => {
                    debug!(
                        "{} on {} conflicted on attempt {}",
                        operation, transaction_id, attempt
                    );
                }
                Err(VerdictError::Conflict(reason)) => {
                    debug!(
                        "{} on {} conflicted on attempt {}: {}",
                        operation, transaction_id, attempt, reason
                    );
                }
                Err(e) => return Err(e),
            }
            self.back_off(attempt, max_attempts).await;
        }

        Err(self.exhausted(operation, transaction_id))
    }

    async fn back_off(&self, attempt: u32, max_attempts: u32) {
        if attempt < max_attempts {
            tokio::time::sleep(self.retry.delay_for(attempt)).await;
        }
    }

    fn exhausted(&self, operation: &str, transaction_id: &str) -> VerdictError {
        warn!(
            "Gave up trying to {} on {} after {} conflicting attempts",
            operation, transaction_id, self.retry.max_attempts
        );
        VerdictError::Unavailable(format!(
            "could not {operation} on {transaction_id}: ledger kept conflicting"
        ))
    }
}

fn validate_transaction_id(transaction_id: &str) -> Result<()> {
    if transaction_id.is_empty() {
        return Err(VerdictError::InvalidArgument(
            "transaction id must not be empty".to_string(),
        ));
    }
    Ok(())
}
