//! Wire messages of the `blockchain.TwoPhaseCommitAdapter` service.
//!
//! The service stubs (`two_phase_commit_adapter_server` and
//! `two_phase_commit_adapter_client`) are generated by `build.rs`.

/// Same layout as `google.protobuf.Timestamp`.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Ballot {
    Unspecified = 0,
    BallotCommit = 1,
    BallotAbort = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum VotingDecision {
    Unknown = 0,
    Pending = 1,
    Commit = 2,
    Abort = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartVotingRequest {
    #[prost(string, tag = "1")]
    pub transaction_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub timeout_time: ::core::option::Option<Timestamp>,
    #[prost(int32, tag = "3")]
    pub cohorts: i32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct StartVotingResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VoteRequest {
    #[prost(string, tag = "1")]
    pub transaction_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub cohort_id: i32,
    #[prost(enumeration = "Ballot", tag = "3")]
    pub ballot: i32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct VoteResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVotingDecisionRequest {
    #[prost(string, tag = "1")]
    pub transaction_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVotingDecisionResponse {
    #[prost(enumeration = "VotingDecision", tag = "1")]
    pub decision: i32,
    #[prost(string, tag = "2")]
    pub reason: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetHeartBeatRequest {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetHeartBeatResponse {
    #[prost(bool, tag = "1")]
    pub is_ok: bool,
}

include!(concat!(env!("OUT_DIR"), "/blockchain.TwoPhaseCommitAdapter.rs"));
