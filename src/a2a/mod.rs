//! A2A protocol data model.
//!
//! Wire-level types for the task lifecycle (`tasks/send`) and agent
//! discovery (the AgentCard). All types serialize with the camelCase
//! field names the protocol mandates.

mod agent_card;
mod types;

pub use agent_card::{AgentCapabilities, AgentCard, AgentSkill};
pub use types::{
    Message, MessageRole, Part, SendTaskRequest, SendTaskResponse, Task, TaskSendParams,
    TaskState, TaskStatus,
};
