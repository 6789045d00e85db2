// Declare the common module *within this test crate*
mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::Code;

use common::{setup_coordinator, setup_flaky_coordinator, ManualClock, T0};
use verdict::rpc::proto::two_phase_commit_adapter_client::TwoPhaseCommitAdapterClient;
use verdict::rpc::proto::{self, GetVotingDecisionRequest, StartVotingRequest, VoteRequest};
use verdict::{
    AdapterService, Ballot, Coordinator, CoordinatorClient, Decision, DecisionKind, Ledger,
    VerdictError,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// --- Test server ---

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start<L: Ledger>(coordinator: Arc<Coordinator<L>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let service = AdapterService::new(coordinator, DEFAULT_TIMEOUT);

        let handle = tokio::spawn(async move {
            Server::builder()
                .add_service(service.into_server())
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn client(&self) -> CoordinatorClient {
        CoordinatorClient::connect(self.endpoint()).await.unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap();
    }
}

async fn start_default() -> (TestServer, Arc<ManualClock>) {
    let (coordinator, clock) = setup_coordinator();
    (TestServer::start(coordinator).await, clock)
}

// --- Scenarios ---

#[tokio::test]
async fn test_commit_over_rpc() {
    let (server, _clock) = start_default().await;
    let client = server.client().await;

    client.start_voting("t1", Some(T0 + 60), 2).await.unwrap();
    client.vote("t1", 0, Ballot::Commit).await.unwrap();
    client.vote("t1", 1, Ballot::Commit).await.unwrap();
    assert_eq!(
        client.get_voting_decision("t1").await.unwrap(),
        Decision::committed()
    );

    server.stop().await;
}

#[tokio::test]
async fn test_abort_and_timeout_over_rpc() {
    let (server, clock) = start_default().await;
    let client = server.client().await;

    client.start_voting("by-vote", Some(T0 + 60), 2).await.unwrap();
    client.vote("by-vote", 1, Ballot::Abort).await.unwrap();
    assert_eq!(
        client.get_voting_decision("by-vote").await.unwrap(),
        Decision::cohort_aborted()
    );

    client.start_voting("by-clock", Some(T0 + 5), 2).await.unwrap();
    client.vote("by-clock", 0, Ballot::Commit).await.unwrap();
    assert_eq!(
        client.get_voting_decision("by-clock").await.unwrap(),
        Decision::pending()
    );
    clock.advance(5);
    assert_eq!(
        client.get_voting_decision("by-clock").await.unwrap(),
        Decision::timed_out()
    );

    server.stop().await;
}

#[tokio::test]
async fn test_missing_timeout_uses_default_window() {
    let (coordinator, clock) = setup_coordinator();
    let server = TestServer::start(coordinator.clone()).await;
    let client = server.client().await;

    client.start_voting("no-deadline", None, 1).await.unwrap();
    let record = coordinator.read_record("no-deadline").await.unwrap();
    assert_eq!(record.deadline(), T0 + DEFAULT_TIMEOUT.as_secs() as i64);

    clock.advance(DEFAULT_TIMEOUT.as_secs() as i64 - 1);
    assert_eq!(
        client.get_voting_decision("no-deadline").await.unwrap().kind,
        DecisionKind::Pending
    );
    clock.advance(1);
    assert_eq!(
        client.get_voting_decision("no-deadline").await.unwrap(),
        Decision::timed_out()
    );

    server.stop().await;
}

// --- Status mapping ---

#[tokio::test]
async fn test_errors_map_to_status_codes() {
    let (server, _clock) = start_default().await;
    let client = server.client().await;

    let err = client.get_voting_decision("ghost").await.unwrap_err();
    assert!(matches!(err, VerdictError::NotFound(_)), "unexpected error: {err:?}");
    assert!(err.to_string().contains("Failed to get voting decision"));

    client.start_voting("once", Some(T0 + 60), 2).await.unwrap();
    let err = client.start_voting("once", Some(T0 + 60), 2).await.unwrap_err();
    assert!(matches!(err, VerdictError::AlreadyExists(_)), "unexpected error: {err:?}");

    let err = client.start_voting("zero", Some(T0 + 60), 0).await.unwrap_err();
    assert!(matches!(err, VerdictError::InvalidArgument(_)), "unexpected error: {err:?}");

    let err = client.vote("once", 2, Ballot::Commit).await.unwrap_err();
    assert!(matches!(err, VerdictError::InvalidArgument(_)), "unexpected error: {err:?}");
    let err = client.vote("once", -1, Ballot::Commit).await.unwrap_err();
    assert!(matches!(err, VerdictError::InvalidArgument(_)), "unexpected error: {err:?}");
    let err = client.vote("ghost", 0, Ballot::Commit).await.unwrap_err();
    assert!(matches!(err, VerdictError::NotFound(_)), "unexpected error: {err:?}");

    server.stop().await;
}

#[tokio::test]
async fn test_raw_requests_with_unset_fields() {
    let (server, _clock) = start_default().await;
    let mut raw = TwoPhaseCommitAdapterClient::connect(server.endpoint())
        .await
        .unwrap();

    raw.start_voting(StartVotingRequest {
        transaction_id: "raw".to_string(),
        timeout_time: Some(proto::Timestamp {
            seconds: T0 + 60,
            nanos: 0,
        }),
        cohorts: 1,
    })
    .await
    .unwrap();

    let status = raw
        .vote(VoteRequest {
            transaction_id: "raw".to_string(),
            cohort_id: 0,
            ballot: proto::Ballot::Unspecified as i32,
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let status = raw
        .get_voting_decision(GetVotingDecisionRequest {
            transaction_id: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    raw.vote(VoteRequest {
        transaction_id: "raw".to_string(),
        cohort_id: 0,
        ballot: proto::Ballot::BallotCommit as i32,
    })
    .await
    .unwrap();
    let response = raw
        .get_voting_decision(GetVotingDecisionRequest {
            transaction_id: "raw".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.decision, proto::VotingDecision::Commit as i32);
    assert_eq!(response.reason, Decision::committed().reason);

    server.stop().await;
}

#[tokio::test]
async fn test_heartbeat_over_rpc() {
    let (coordinator, ledger, _clock) = setup_flaky_coordinator(2);
    let server = TestServer::start(coordinator).await;
    let client = server.client().await;

    assert!(client.get_heart_beat().await.unwrap());

    ledger.set_unavailable(true);
    let err = client.get_heart_beat().await.unwrap_err();
    assert!(matches!(err, VerdictError::Unavailable(_)), "unexpected error: {err:?}");
    assert!(err.to_string().contains("Failed to get heartbeat"));

    server.stop().await;
}

#[tokio::test]
async fn test_shared_client_concurrent_votes() {
    let (server, _clock) = start_default().await;
    let client = server.client().await;
    let cohorts = 10;
    client.start_voting("shared", Some(T0 + 60), cohorts).await.unwrap();

    let handles: Vec<_> = (0..cohorts)
        .map(|cohort| {
            let client = client.clone();
            tokio::spawn(async move { client.vote("shared", cohort, Ballot::Commit).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(
        client.get_voting_decision("shared").await.unwrap(),
        Decision::committed()
    );

    server.stop().await;
}
