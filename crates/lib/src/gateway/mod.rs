//! Gateway: the Messenger webhook HTTP server.
//!
//! `GET /` answers the verification handshake, `POST /` accepts event callbacks and hands each
//! event to the dispatcher, `GET /health` reports liveness.

mod protocol;
mod server;
mod signature;

pub use protocol::VerifyParams;
pub use server::{router, run_gateway, spawn_event_processor, GatewayState};
pub use signature::verify_signature;
