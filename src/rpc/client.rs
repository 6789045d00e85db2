use tonic::transport::{Channel, Endpoint};

use crate::codec;
use crate::decision::{Ballot, Decision};
use crate::errors::{Result, VerdictError};
use crate::rpc::proto::two_phase_commit_adapter_client::TwoPhaseCommitAdapterClient;
use crate::rpc::proto::{
    GetHeartBeatRequest, GetVotingDecisionRequest, StartVotingRequest, Timestamp, VoteRequest,
};

/// Typed client for the coordinator adapter service.
///
/// Remote statuses are turned back into [`VerdictError`] with a short
/// context prefix naming the failed call. The client is cheap to clone and
/// every call works on its own copy of the channel, so one client can be
/// shared by concurrent cohorts.
#[derive(Clone)]
pub struct CoordinatorClient {
    inner: TwoPhaseCommitAdapterClient<Channel>,
}

impl CoordinatorClient {
    /// Connects to an adapter at `endpoint`, e.g. `http://127.0.0.1:50051`.
    ///
    /// # Errors
    ///
    /// Returns [`VerdictError::InvalidArgument`] for a malformed endpoint and
    /// [`VerdictError::Unavailable`] if the connection cannot be made.
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = Endpoint::from_shared(endpoint.into())
            .map_err(|e| VerdictError::InvalidArgument(format!("invalid endpoint: {e}")))?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| VerdictError::Unavailable(format!("failed to connect: {e}")))?;
        Ok(Self::new(channel))
    }

    pub fn new(channel: Channel) -> Self {
        Self {
            inner: TwoPhaseCommitAdapterClient::new(channel),
        }
    }

    /// Registers a transaction. Without a `deadline` the server applies its
    /// default voting window.
    pub async fn start_voting(
        &self,
        transaction_id: &str,
        deadline: Option<i64>,
        cohorts: i32,
    ) -> Result<()> {
        let request = StartVotingRequest {
            transaction_id: transaction_id.to_string(),
            timeout_time: deadline.map(|seconds| Timestamp { seconds, nanos: 0 }),
            cohorts,
        };
        self.inner
            .clone()
            .start_voting(request)
            .await
            .map_err(|status| VerdictError::from(status).context("Failed to start voting"))?;
        Ok(())
    }

    pub async fn vote(&self, transaction_id: &str, cohort_id: i32, ballot: Ballot) -> Result<()> {
        let request = VoteRequest {
            transaction_id: transaction_id.to_string(),
            cohort_id,
            ballot: codec::ballot_to_wire(ballot),
        };
        self.inner
            .clone()
            .vote(request)
            .await
            .map_err(|status| VerdictError::from(status).context("Failed to vote"))?;
        Ok(())
    }

    pub async fn get_voting_decision(&self, transaction_id: &str) -> Result<Decision> {
        let request = GetVotingDecisionRequest {
            transaction_id: transaction_id.to_string(),
        };
        let response = self
            .inner
            .clone()
            .get_voting_decision(request)
            .await
            .map_err(|status| VerdictError::from(status).context("Failed to get voting decision"))?
            .into_inner();
        Ok(Decision::new(codec::kind_from_wire(response.decision), response.reason))
    }

    pub async fn get_heart_beat(&self) -> Result<bool> {
        let response = self
            .inner
            .clone()
            .get_heart_beat(GetHeartBeatRequest {})
            .await
            .map_err(|status| VerdictError::from(status).context("Failed to get heartbeat"))?
            .into_inner();
        Ok(response.is_ok)
    }
}
