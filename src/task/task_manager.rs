use std::sync::Arc;

use super::task_store::TaskStore;
use crate::a2a::{
    AgentCapabilities, Message, SendTaskRequest, SendTaskResponse, TaskSendParams, TaskState,
};
use crate::agents::AgentBackend;
use crate::errors::{AgentError, AgentResult};

/// Drives one `tasks/send` request through the task state machine.
///
/// The manager composes a [`TaskStore`] for bookkeeping with an injected
/// [`AgentBackend`] for response generation; which backend runs is decided
/// at construction time, not by subclassing. It is the only writer of task
/// state, and it never raises outward: every inbound request receives a
/// well-formed [`SendTaskResponse`], success or error.
pub struct TaskManager {
    store: Arc<dyn TaskStore>,
    backend: Arc<dyn AgentBackend>,
    streaming: bool,
}

impl TaskManager {
    pub fn new(
        store: Arc<dyn TaskStore>,
        backend: Arc<dyn AgentBackend>,
        capabilities: AgentCapabilities,
    ) -> Self {
        Self {
            store,
            backend,
            streaming: capabilities.streaming,
        }
    }

    /// Handle a `tasks/send` request: validate, admit the task into
    /// processing, invoke the backend and drive the task to a terminal
    /// state. A follow-up send to a completed task reopens it for another
    /// cycle; a send that loses the race against an in-flight one for the
    /// same id is rejected whole, its message never enters the history.
    pub async fn on_send_task(&self, request: SendTaskRequest) -> SendTaskResponse {
        let params = &request.params;

        // Reject malformed params before any store mutation.
        let query = match Self::validate(params) {
            Ok(query) => query.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "rejected malformed tasks/send request");
                return SendTaskResponse::error(request.id, &e);
            }
        };

        tracing::info!(task_id = %params.id, session_id = %params.session_id, "processing task");

        // Admission is a single store operation, so a rejected send has
        // mutated nothing.
        if let Err(e) = self.store.claim(params).await {
            tracing::warn!(task_id = %params.id, error = %e, "task not admitted");
            return SendTaskResponse::error(request.id, &e);
        }

        // The backend call is slow I/O and runs outside every store lock so
        // one stalled backend never serializes unrelated tasks.
        let outcome = self.backend.invoke(&query, &params.session_id).await;

        let finalized = match outcome {
            Ok(text) => {
                self.store
                    .finalize(
                        &params.id,
                        TaskState::Completed,
                        Some(Message::agent_text(text)),
                        None,
                    )
                    .await
            }
            Err(e) => {
                // Backend faults never escape the manager; the task fails
                // and the server keeps serving other tasks.
                tracing::warn!(task_id = %params.id, error = %e, "backend invocation failed");
                let detail = AgentError::Backend {
                    message: e.to_string(),
                };
                self.store
                    .finalize(
                        &params.id,
                        TaskState::Failed,
                        None,
                        Some(Message::agent_text(detail.to_string())),
                    )
                    .await
            }
        };

        match finalized {
            Ok(task) => SendTaskResponse::success(request.id, task),
            Err(e) => SendTaskResponse::error(request.id, &e),
        }
    }

    /// Handle a `tasks/sendSubscribe` request.
    ///
    /// When the card declares `streaming: false` the request is rejected
    /// before any task mutation, never silently downgraded to the
    /// non-streaming path.
    pub async fn on_send_task_subscribe(&self, request: SendTaskRequest) -> SendTaskResponse {
        if !self.streaming {
            let e = AgentError::UnsupportedOperation {
                operation: "streaming".to_string(),
            };
            tracing::warn!(task_id = %request.params.id, "rejected tasks/sendSubscribe: streaming disabled");
            return SendTaskResponse::error(request.id, &e);
        }

        // Streaming transport is not served over this endpoint; the flag
        // exists for cards fronting a streaming-capable deployment.
        let e = AgentError::UnsupportedOperation {
            operation: "tasks/sendSubscribe".to_string(),
        };
        SendTaskResponse::error(request.id, &e)
    }

    /// Snapshot of a task, for `tasks/get`-style reads.
    pub async fn get_task(&self, task_id: &str) -> AgentResult<crate::a2a::Task> {
        self.store.get(task_id).await
    }

    fn validate(params: &TaskSendParams) -> AgentResult<&str> {
        if params.id.trim().is_empty() {
            return Err(AgentError::Validation {
                field: "id".to_string(),
                reason: "task id must not be empty".to_string(),
            });
        }
        if params.session_id.trim().is_empty() {
            return Err(AgentError::Validation {
                field: "sessionId".to_string(),
                reason: "session id must not be empty".to_string(),
            });
        }
        match params.message.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(AgentError::Validation {
                field: "message".to_string(),
                reason: "text of the first part must not be empty".to_string(),
            }),
            None => Err(AgentError::Validation {
                field: "message".to_string(),
                reason: "first part must be a text part".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::MessageRole;
    use crate::server::json_rpc::JsonRpcId;
    use crate::task::InMemoryTaskStore;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::task::JoinSet;

    /// Answers from a fixed menu; fails when the query asks for trouble.
    struct MenuBackend;

    #[async_trait]
    impl AgentBackend for MenuBackend {
        async fn invoke(&self, query: &str, _session_id: &str) -> AgentResult<String> {
            if query.contains("boom") {
                return Err(AgentError::Backend {
                    message: "model provider unavailable".to_string(),
                });
            }
            let answer = if query.to_lowercase().contains("burger") {
                "We have cheeseburgers, chicken burgers and veggie burgers."
            } else {
                "We serve burgers, pizza and drinks."
            };
            Ok(answer.to_string())
        }
    }

    /// Holds the invocation open until released, keeping its task in
    /// `Working` for as long as a test needs.
    struct GatedBackend {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl AgentBackend for GatedBackend {
        async fn invoke(&self, _query: &str, _session_id: &str) -> AgentResult<String> {
            self.gate.notified().await;
            Ok("released".to_string())
        }
    }

    fn manager_with_store(streaming: bool) -> (TaskManager, Arc<InMemoryTaskStore>) {
        let store = Arc::new(InMemoryTaskStore::new());
        let manager = TaskManager::new(
            store.clone(),
            Arc::new(MenuBackend),
            AgentCapabilities { streaming },
        );
        (manager, store)
    }

    fn send_request(task_id: &str, session_id: &str, text: &str) -> SendTaskRequest {
        SendTaskRequest {
            jsonrpc: "2.0".to_string(),
            id: JsonRpcId::String(format!("req-{task_id}")),
            method: "tasks/send".to_string(),
            params: TaskSendParams {
                id: task_id.to_string(),
                session_id: session_id.to_string(),
                message: Message::user_text(text),
            },
        }
    }

    #[tokio::test]
    async fn test_send_task_completes_with_agent_reply() {
        let (manager, _store) = manager_with_store(false);

        let response = manager
            .on_send_task(send_request("t1", "s1", "What burgers do you have?"))
            .await;

        assert!(response.error.is_none());
        let task = response.result.unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.history[0].role, MessageRole::User);
        assert_eq!(task.history[1].role, MessageRole::Agent);
        assert!(!task.history[1].first_text().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_isolated() {
        let (manager, _store) = manager_with_store(false);

        let response = manager.on_send_task(send_request("t2", "s1", "boom")).await;
        assert!(response.error.is_none());
        let task = response.result.unwrap();
        assert_eq!(task.status.state, TaskState::Failed);
        // Error detail rides on the status, not the history.
        assert!(task.status.message.is_some());
        assert_eq!(task.history.len(), 1);

        // The process stays healthy: a fresh task still succeeds.
        let response = manager
            .on_send_task(send_request("t3", "s1", "What burgers do you have?"))
            .await;
        assert_eq!(response.result.unwrap().status.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_validation_rejected_before_any_mutation() {
        let (manager, store) = manager_with_store(false);

        let response = manager.on_send_task(send_request("", "s1", "hello")).await;
        assert_eq!(response.error.as_ref().unwrap().code, -32602);
        assert!(response.result.is_none());

        let mut no_parts = send_request("t1", "s1", "hello");
        no_parts.params.message.parts.clear();
        let response = manager.on_send_task(no_parts).await;
        assert_eq!(response.error.as_ref().unwrap().code, -32602);

        let response = manager.on_send_task(send_request("t1", "", "hello")).await;
        assert_eq!(response.error.as_ref().unwrap().code, -32602);

        // No task was ever created.
        assert!(store.get("t1").await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_subscribe_rejected_without_streaming() {
        let (manager, store) = manager_with_store(false);

        let mut request = send_request("t1", "s1", "hello");
        request.method = "tasks/sendSubscribe".to_string();
        let response = manager.on_send_task_subscribe(request).await;

        assert_eq!(response.error.as_ref().unwrap().code, -32004);
        // Rejected before any task mutation.
        assert!(store.get("t1").await.is_err());
    }

    #[tokio::test]
    async fn test_follow_up_send_reopens_completed_task() {
        let (manager, _store) = manager_with_store(false);

        let first = manager
            .on_send_task(send_request("t1", "s1", "What burgers do you have?"))
            .await;
        assert_eq!(first.result.unwrap().status.state, TaskState::Completed);

        // Same id, next turn: the task re-enters processing and the
        // history alternates user/agent across both cycles.
        let second = manager
            .on_send_task(send_request("t1", "s1", "And what else is on the menu?"))
            .await;
        assert!(second.error.is_none());
        let task = second.result.unwrap();
        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(task.history.len(), 4);
        let roles: Vec<_> = task.history.iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Agent,
                MessageRole::User,
                MessageRole::Agent
            ]
        );
    }

    #[tokio::test]
    async fn test_resend_to_failed_task_rejected() {
        let (manager, _store) = manager_with_store(false);

        let first = manager.on_send_task(send_request("t1", "s1", "boom")).await;
        let done = first.result.unwrap();
        assert_eq!(done.status.state, TaskState::Failed);

        let second = manager.on_send_task(send_request("t1", "s1", "And pizza?")).await;
        assert_eq!(second.error.as_ref().unwrap().code, -32002);

        // Status and history unchanged after the rejected send.
        let after = manager.get_task("t1").await.unwrap();
        assert_eq!(after.status, done.status);
        assert_eq!(after.history, done.history);
    }

    #[tokio::test]
    async fn test_losing_concurrent_send_leaves_no_trace() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(InMemoryTaskStore::new());
        let manager = Arc::new(TaskManager::new(
            store.clone(),
            Arc::new(GatedBackend { gate: gate.clone() }),
            AgentCapabilities { streaming: false },
        ));

        let first = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.on_send_task(send_request("t1", "s1", "first")).await }
        });
        // Wait until the first send holds the task.
        loop {
            match store.get("t1").await {
                Ok(task) if task.status.state == TaskState::Working => break,
                _ => tokio::task::yield_now().await,
            }
        }

        let second = manager.on_send_task(send_request("t1", "s1", "second")).await;
        assert_eq!(second.error.as_ref().unwrap().code, -32002);

        // The rejected send's message never entered the history.
        let snapshot = store.get("t1").await.unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].first_text(), Some("first"));

        gate.notify_one();
        let task = first.await.unwrap().result.expect("first send should succeed");
        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.history[0].first_text(), Some("first"));
    }

    #[tokio::test]
    async fn test_concurrent_sends_to_distinct_tasks() {
        let (manager, _store) = manager_with_store(false);
        let manager = Arc::new(manager);
        let n = 20;

        let mut join_set = JoinSet::new();
        for i in 0..n {
            let manager = Arc::clone(&manager);
            join_set.spawn(async move {
                manager
                    .on_send_task(send_request(&format!("t{i}"), "s1", "menu please"))
                    .await
            });
        }

        while let Some(result) = join_set.join_next().await {
            let response = result.unwrap();
            let task = response.result.expect("send should succeed");
            assert_eq!(task.status.state, TaskState::Completed);
            assert_eq!(task.history.len(), 2);
        }
    }
}
