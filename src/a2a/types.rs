use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::json_rpc::{JsonRpcError, JsonRpcId};

// ============================================================================
// Task Lifecycle Types
// ============================================================================

/// Lifecycle state of a task.
///
/// `Submitted` -> `Working` -> {`Completed`, `Failed`, `Canceled`}.
/// The three right-hand states end a processing cycle. A completed task
/// may be reopened to `Working` by a follow-up send; failed and canceled
/// tasks are final and their history becomes immutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Canceled,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// Whether a task in this state can accept another user message.
    /// Completed tasks can: a follow-up send reopens them for a new
    /// processing cycle. Failed and canceled tasks are immutable.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Submitted | Self::Working | Self::Completed)
    }

    /// Whether the state machine permits moving from `self` to `to`.
    pub fn can_transition_to(&self, to: TaskState) -> bool {
        match (self, to) {
            (Self::Submitted, Self::Working) => true,
            (Self::Working, Self::Completed) | (Self::Working, Self::Failed) => true,
            // A follow-up send reopens a completed task.
            (Self::Completed, Self::Working) => true,
            // Explicit cancellation is allowed from any non-terminal state.
            (from, Self::Canceled) if !from.is_terminal() => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Error detail attached when the backend fails; otherwise absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl TaskStatus {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            timestamp: Some(Utc::now()),
            message: None,
        }
    }

    pub fn with_message(state: TaskState, message: Message) -> Self {
        Self {
            state,
            timestamp: Some(Utc::now()),
            message: Some(message),
        }
    }
}

/// One request/response lifecycle unit, identified by a client-supplied id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub status: TaskStatus,
    /// Append-only conversational history, never reordered.
    pub history: Vec<Message>,
}

impl Task {
    /// A freshly submitted task carrying the initial user message.
    pub fn submitted(id: impl Into<String>, session_id: impl Into<String>, initial: Message) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            status: TaskStatus::new(TaskState::Submitted),
            history: vec![initial],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn agent_text(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Agent,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Text of the first part, if that part is a text part.
    pub fn first_text(&self) -> Option<&str> {
        match self.parts.first() {
            Some(Part::Text { text }) => Some(text.as_str()),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
}

// ============================================================================
// Method Parameter and Request/Response Types
// ============================================================================

/// Parameters of a `tasks/send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSendParams {
    /// Client-supplied task id. Some clients send this as `taskId`.
    #[serde(alias = "taskId")]
    pub id: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub message: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTaskRequest {
    pub jsonrpc: String, // Always "2.0"
    pub id: JsonRpcId,
    pub method: String, // Always "tasks/send" or "tasks/sendSubscribe"
    pub params: TaskSendParams,
}

/// Response to a `tasks/send` call: echoes the request id and carries either
/// the final task snapshot or a structured error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTaskResponse {
    pub jsonrpc: String, // Always "2.0"
    pub id: Option<JsonRpcId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl SendTaskResponse {
    pub fn success(id: JsonRpcId, task: Task) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result: Some(task),
            error: None,
        }
    }

    pub fn error(id: JsonRpcId, error: &crate::errors::AgentError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result: None,
            error: Some(JsonRpcError {
                code: error.json_rpc_code(),
                message: error.to_string(),
                data: None,
            }),
        }
    }
}
