//! Minimal Agent-to-Agent (A2A) protocol framework.
//!
//! Independent agent services advertise capabilities through an
//! [`AgentCard`](a2a::AgentCard) and accept task-oriented JSON-RPC requests
//! (`tasks/send`) over HTTP. The core is an in-memory, concurrency-safe
//! [`TaskStore`] plus the [`TaskManager`] that drives each task through its
//! state machine while delegating response generation to a pluggable
//! [`AgentBackend`].

pub mod a2a;
pub mod agents;
pub mod errors;
pub mod server;
pub mod task;

// Re-export key task management types for easier access
pub use task::{InMemoryTaskStore, TaskManager, TaskStore};

// Re-export the backend seam and error types for easier access
pub use agents::AgentBackend;
pub use errors::{AgentError, AgentResult};
