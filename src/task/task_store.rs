use async_trait::async_trait;

use crate::a2a::{Message, Task, TaskSendParams, TaskState};
use crate::errors::AgentResult;

/// Abstraction for process-lifetime task storage.
///
/// Implementations must be safe for concurrent use: many requests may target
/// the same task id at once, and every mutation below is required to be
/// atomic: no reader may observe a half-appended history or a status that
/// disagrees with it.
///
/// The state machine is enforced here, not in callers: any transition the
/// state machine forbids, and any append to a failed or canceled task's
/// history, fails with `InvalidTaskStateTransition`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Register a task or append to an existing one.
    ///
    /// If `params.id` is unseen, creates the task in `Submitted` state with
    /// `history = [params.message]`. If seen and the task still accepts
    /// input, appends `params.message` to the history. Returns the
    /// resulting task snapshot either way.
    async fn upsert(&self, params: &TaskSendParams) -> AgentResult<Task>;

    /// Atomically admit a send into processing.
    ///
    /// For an unseen id, creates the task and moves it to `Working`. For a
    /// completed task, appends `params.message` and reopens it to `Working`
    /// for another cycle. Anything else fails before touching the task, so
    /// a rejected send leaves no trace: an in-flight (`Submitted` or
    /// `Working`) task is owned by another request, and failed or canceled
    /// tasks are immutable.
    async fn claim(&self, params: &TaskSendParams) -> AgentResult<Task>;

    /// Retrieve a task snapshot by id, or fail with `TaskNotFound`.
    async fn get(&self, task_id: &str) -> AgentResult<Task>;

    /// Update a task's status, validating the transition. Returns the
    /// updated snapshot.
    async fn update_status(&self, task_id: &str, state: TaskState) -> AgentResult<Task>;

    /// Append a message to a task's history.
    async fn append_message(&self, task_id: &str, message: Message) -> AgentResult<()>;

    /// Atomically drive a task to a terminal state.
    ///
    /// The status update, the optional history append and the optional
    /// status-attached message all happen in one critical section, so no
    /// reader observes a completed status with missing history or vice
    /// versa. Returns the final snapshot.
    async fn finalize(
        &self,
        task_id: &str,
        state: TaskState,
        history_message: Option<Message>,
        status_message: Option<Message>,
    ) -> AgentResult<Task>;

    /// Remove a task. Succeeds silently if the id is unknown (idempotent).
    async fn remove(&self, task_id: &str) -> AgentResult<()>;
}
