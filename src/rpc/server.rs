use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tonic::{transport::Server, Request, Response, Status};

use crate::codec;
use crate::config::CoordinatorConfig;
use crate::coordinator::Coordinator;
use crate::errors::{Result, VerdictError};
use crate::ledger::Ledger;
use crate::rpc::proto::two_phase_commit_adapter_server::{
    TwoPhaseCommitAdapter, TwoPhaseCommitAdapterServer,
};
use crate::rpc::proto::{
    GetHeartBeatRequest, GetHeartBeatResponse, GetVotingDecisionRequest,
    GetVotingDecisionResponse, StartVotingRequest, StartVotingResponse, VoteRequest, VoteResponse,
};

/// Adapts inbound RPCs onto a [`Coordinator`].
///
/// The service only translates arguments and results; validation, retries
/// and resolution all happen in the coordinator.
pub struct AdapterService<L: Ledger> {
    coordinator: Arc<Coordinator<L>>,
    /// Voting window for `StartVoting` requests without a timeout.
    default_vote_timeout: Duration,
}

impl<L: Ledger> AdapterService<L> {
    pub fn new(coordinator: Arc<Coordinator<L>>, default_vote_timeout: Duration) -> Self {
        Self {
            coordinator,
            default_vote_timeout,
        }
    }

    /// Wraps the service for registration with a tonic server.
    pub fn into_server(self) -> TwoPhaseCommitAdapterServer<Self> {
        TwoPhaseCommitAdapterServer::new(self)
    }
}

#[tonic::async_trait]
impl<L: Ledger> TwoPhaseCommitAdapter for AdapterService<L> {
    async fn start_voting(
        &self,
        request: Request<StartVotingRequest>,
    ) -> std::result::Result<Response<StartVotingResponse>, Status> {
        let request = request.into_inner();
        debug!("Received: StartVoting {}", request.transaction_id);

        // Deadlines have seconds granularity; nanos are dropped.
        let deadline = match request.timeout_time {
            Some(ts) => ts.seconds,
            None => self.coordinator.now_secs() + self.default_vote_timeout.as_secs() as i64,
        };
        self.coordinator
            .start_voting(&request.transaction_id, request.cohorts, deadline)
            .await?;
        Ok(Response::new(StartVotingResponse {}))
    }

    async fn vote(
        &self,
        request: Request<VoteRequest>,
    ) -> std::result::Result<Response<VoteResponse>, Status> {
        let request = request.into_inner();
        debug!(
            "Received: Vote {} cohort {}",
            request.transaction_id, request.cohort_id
        );

        let ballot = codec::ballot_from_wire(request.ballot).ok_or_else(|| {
            VerdictError::InvalidArgument(format!("unknown ballot value {}", request.ballot))
        })?;
        self.coordinator
            .vote(&request.transaction_id, request.cohort_id, ballot)
            .await?;
        Ok(Response::new(VoteResponse {}))
    }

    async fn get_voting_decision(
        &self,
        request: Request<GetVotingDecisionRequest>,
    ) -> std::result::Result<Response<GetVotingDecisionResponse>, Status> {
        let request = request.into_inner();
        debug!("Received: GetVotingDecision {}", request.transaction_id);

        let decision = self
            .coordinator
            .get_voting_decision(&request.transaction_id)
            .await?;
        Ok(Response::new(GetVotingDecisionResponse {
            decision: codec::kind_to_wire(decision.kind),
            reason: decision.reason,
        }))
    }

    async fn get_heart_beat(
        &self,
        _request: Request<GetHeartBeatRequest>,
    ) -> std::result::Result<Response<GetHeartBeatResponse>, Status> {
        let is_ok = self.coordinator.get_heart_beat().await?;
        Ok(Response::new(GetHeartBeatResponse { is_ok }))
    }
}

/// Serves the adapter on `config.listen_addr` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`VerdictError::Unavailable`] if the listener cannot be bound or
/// the server fails.
pub async fn serve<L, F>(
    coordinator: Arc<Coordinator<L>>,
    config: &CoordinatorConfig,
    shutdown: F,
) -> Result<()>
where
    L: Ledger,
    F: Future<Output = ()> + Send,
{
    let service = AdapterService::new(coordinator, config.default_vote_timeout);

    let mut builder = Server::builder();
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    info!("Coordinator adapter listening on {}", config.listen_addr);
    builder
        .add_service(service.into_server())
        .serve_with_shutdown(config.listen_addr, shutdown)
        .await
        .map_err(|e| VerdictError::Unavailable(format!("adapter server failed: {e}")))?;
    info!("Coordinator adapter stopped");
    Ok(())
}
