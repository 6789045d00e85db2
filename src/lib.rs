pub mod clock;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod decision;
pub mod errors;
pub mod ledger;
pub mod record;
pub mod rpc;

// Re-export key types and structs for easier access
pub use clock::{Clock, SystemClock};
pub use config::{CoordinatorConfig, LedgerBackend, RetryPolicy};
pub use coordinator::Coordinator;
pub use decision::{Ballot, Decision, DecisionKind};
pub use errors::{Result, VerdictError};
pub use ledger::{CreateOutcome, Ledger, MemoryLedger, SwapOutcome};
#[cfg(feature = "durable")]
pub use ledger::RocksLedger;
pub use record::{CohortId, TransactionRecord, VoteEffect};
pub use rpc::{AdapterService, CoordinatorClient};

/// Verdict Prelude
pub mod prelude {
    pub use crate::rpc::*;
    pub use crate::*;
}
