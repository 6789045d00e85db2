use tonic_build::manual::{Builder, Method, Service};

fn method(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::rpc::proto::{input}"))
        .output_type(format!("crate::rpc::proto::{output}"))
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

fn main() {
    // The adapter service is described in Rust so that the build does not
    // depend on a system `protoc`. Messages live in `src/rpc/proto.rs`.
    let adapter = Service::builder()
        .name("TwoPhaseCommitAdapter")
        .package("blockchain")
        .method(method(
            "start_voting",
            "StartVoting",
            "StartVotingRequest",
            "StartVotingResponse",
        ))
        .method(method("vote", "Vote", "VoteRequest", "VoteResponse"))
        .method(method(
            "get_voting_decision",
            "GetVotingDecision",
            "GetVotingDecisionRequest",
            "GetVotingDecisionResponse",
        ))
        .method(method(
            "get_heart_beat",
            "GetHeartBeat",
            "GetHeartBeatRequest",
            "GetHeartBeatResponse",
        ))
        .build();

    Builder::new().compile(&[adapter]);
    println!("cargo:rerun-if-changed=build.rs");
}
