//! The RPC boundary: wire messages, the adapter service and a typed client.

pub mod client;
pub mod proto;
pub mod server;

pub use client::CoordinatorClient;
pub use server::{serve, AdapterService};
