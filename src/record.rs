use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec;
use crate::decision::{Ballot, Decision, DecisionKind};
use crate::errors::{Result, VerdictError};

/// Identifies a cohort within a transaction, in `[0, cohort_count)`.
pub type CohortId = u32;

/// The coordination state of one transaction, as persisted in the ledger.
///
/// A record is created once by `StartVoting` and afterwards mutated by votes
/// and by the first read that observes a terminal outcome. The decision is
/// derived from the votes and the clock; the only decision that is ever
/// stored is a terminal one, which freezes the outcome for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Number of cohorts expected to vote. Fixed at registration.
    cohort_count: u32,
    /// Seconds since the Unix epoch after which the record stops waiting.
    deadline: i64,
    /// Latest ballot per cohort.
    votes: BTreeMap<CohortId, Ballot>,
    /// Terminal decision in its compact encoding, or [`codec::UNSET`].
    decision: String,
}

/// What happened to a ballot handed to [`TransactionRecord::apply_vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteEffect {
    /// The ballot was recorded and the outcome was still open.
    Counted,
    /// The ballot was recorded for bookkeeping, but the outcome had already
    /// been decided and stays as it was.
    Ignored,
}

impl TransactionRecord {
    pub fn new(cohort_count: u32, deadline: i64) -> Self {
        Self {
            cohort_count,
            deadline,
            votes: BTreeMap::new(),
            decision: codec::UNSET.to_string(),
        }
    }

    pub fn cohort_count(&self) -> u32 {
        self.cohort_count
    }

    pub fn deadline(&self) -> i64 {
        self.deadline
    }

    pub fn votes(&self) -> &BTreeMap<CohortId, Ballot> {
        &self.votes
    }

    pub fn ballot(&self, cohort_id: CohortId) -> Option<Ballot> {
        self.votes.get(&cohort_id).copied()
    }

    /// Number of distinct cohorts whose latest ballot is `Commit`.
    pub fn commit_votes(&self) -> usize {
        self.votes.values().filter(|b| **b == Ballot::Commit).count()
    }

    pub fn has_abort_vote(&self) -> bool {
        self.votes.values().any(|b| *b == Ballot::Abort)
    }

    /// The stored terminal decision, if the outcome has been frozen.
    pub fn frozen_decision(&self) -> Option<Decision> {
        let decision = codec::decode(&self.decision);
        decision.is_terminal().then_some(decision)
    }

    /// Resolves the decision as of `now`.
    ///
    /// A frozen decision wins. Otherwise the rules apply in order: a full
    /// commit quorum commits, any abort ballot aborts, a passed deadline
    /// aborts, and anything else is still pending.
    pub fn resolve(&self, now: i64) -> Decision {
        if let Some(decision) = self.frozen_decision() {
            return decision;
        }
        if self.commit_votes() == self.cohort_count as usize {
            Decision::committed()
        } else if self.has_abort_vote() {
            Decision::cohort_aborted()
        } else if now >= self.deadline {
            Decision::timed_out()
        } else {
            Decision::pending()
        }
    }

    /// Records `ballot` for `cohort_id`, replacing any earlier ballot from
    /// the same cohort.
    ///
    /// A ballot only counts while the outcome is open: the decision has not
    /// been frozen and `now` is before the deadline. Past the deadline the
    /// outcome as of `now` is frozen first, so a late ballot can never turn a
    /// timeout into a commit. Either way the ballot itself is recorded.
    ///
    /// The ballot that completes the commit quorum freezes `Commit` on the
    /// spot. An abort is only frozen once observed, so a cohort can still
    /// replace its abort with a commit until then.
    pub fn apply_vote(
        &mut self,
        cohort_id: CohortId,
        ballot: Ballot,
        now: i64,
    ) -> Result<VoteEffect> {
        if cohort_id >= self.cohort_count {
            return Err(VerdictError::InvalidArgument(format!(
                "cohort id {} out of range [0, {})",
                cohort_id, self.cohort_count
            )));
        }

        if self.frozen_decision().is_some() {
            self.votes.insert(cohort_id, ballot);
            return Ok(VoteEffect::Ignored);
        }
        if now >= self.deadline {
            let decision = self.resolve(now);
            self.freeze(&decision);
            self.votes.insert(cohort_id, ballot);
            return Ok(VoteEffect::Ignored);
        }

        self.votes.insert(cohort_id, ballot);
        let decision = self.resolve(now);
        if decision.kind == DecisionKind::Commit {
            self.freeze(&decision);
        }
        Ok(VoteEffect::Counted)
    }

    /// Freezes the decision as of `now` if it is terminal and not frozen yet.
    ///
    /// Returns the resolved decision and whether the record changed.
    pub fn settle(&mut self, now: i64) -> (Decision, bool) {
        if let Some(decision) = self.frozen_decision() {
            return (decision, false);
        }
        let decision = self.resolve(now);
        if decision.is_terminal() {
            self.freeze(&decision);
            return (decision, true);
        }
        (decision, false)
    }

    fn freeze(&mut self, decision: &Decision) {
        self.decision = codec::encode(decision);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
