use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason reported when every cohort voted to commit before the deadline.
pub const REASON_COMMITTED: &str = "Sufficient vote collected before timeout.";
/// Reason reported when a cohort voted to abort.
pub const REASON_COHORT_ABORTED: &str = "At least one cohort aborted.";
/// Reason reported when the deadline passed without a full commit quorum.
pub const REASON_TIMED_OUT: &str = "Timed out before sufficient votes collected.";
/// Reason reported while the outcome is still open.
pub const REASON_AWAITING: &str = "Awaiting votes.";

/// A cohort's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ballot {
    Commit,
    Abort,
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ballot::Commit => f.write_str("COMMIT"),
            Ballot::Abort => f.write_str("ABORT"),
        }
    }
}

/// The outcome class of a transaction.
///
/// `Unknown` never comes out of the resolution algorithm. It only appears
/// when a compact decision string carries no recognizable kind marker, and
/// callers must read it as "no information" rather than as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    Unknown,
    Pending,
    Commit,
    Abort,
}

impl DecisionKind {
    /// `Commit` and `Abort` never change once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, DecisionKind::Commit | DecisionKind::Abort)
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionKind::Unknown => "UNKNOWN",
            DecisionKind::Pending => "PENDING",
            DecisionKind::Commit => "COMMIT",
            DecisionKind::Abort => "ABORT",
        };
        f.write_str(name)
    }
}

/// A resolved (or still pending) decision with its human-readable reason.
///
/// The reason is informational only; nothing in this crate parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub reason: String,
}

impl Decision {
    pub fn new(kind: DecisionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn committed() -> Self {
        Self::new(DecisionKind::Commit, REASON_COMMITTED)
    }

    pub fn cohort_aborted() -> Self {
        Self::new(DecisionKind::Abort, REASON_COHORT_ABORTED)
    }

    pub fn timed_out() -> Self {
        Self::new(DecisionKind::Abort, REASON_TIMED_OUT)
    }

    pub fn pending() -> Self {
        Self::new(DecisionKind::Pending, REASON_AWAITING)
    }

    pub fn unknown() -> Self {
        Self::new(DecisionKind::Unknown, "")
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.reason)
    }
}
