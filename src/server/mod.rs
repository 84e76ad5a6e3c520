//! HTTP-facing layer: JSON-RPC dispatch and agent discovery over axum.

pub mod json_rpc;
mod routes;
#[allow(clippy::module_inception)]
mod server;

pub use routes::{create_routes, ServerState};
pub use server::{AgentServer, AgentServerBuilder};
