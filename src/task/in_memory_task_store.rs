use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::task_store::TaskStore;
use crate::a2a::{Message, Task, TaskSendParams, TaskState, TaskStatus};
use crate::errors::{AgentError, AgentResult};

/// In-memory implementation of TaskStore.
///
/// Storage is sharded per task id: the outer map is guarded by an `RwLock`
/// and each task by its own `Mutex`. Concurrent mutations to the same id are
/// strictly serialized while unrelated tasks proceed in parallel: the map
/// lock is only held long enough to look up or insert an entry, never across
/// a task mutation.
///
/// Tasks live for the life of the process unless a retention policy is
/// configured, in which case [`sweep`](Self::sweep) evicts terminal tasks
/// whose last status change is older than the retention window. In-flight
/// (non-terminal) tasks are never evicted.
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Arc<Mutex<Task>>>>,
    retention: Option<Duration>,
}

impl InMemoryTaskStore {
    /// Create a new empty in-memory task store with no eviction policy.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            retention: None,
        }
    }

    /// Create a store that considers terminal tasks eligible for eviction
    /// once their final status is older than `retention`.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            retention: Some(retention),
        }
    }

    /// Number of tasks currently held.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Clear all tasks from storage. Primarily used for testing.
    pub async fn clear(&self) {
        self.tasks.write().await.clear();
    }

    /// Evict terminal tasks older than the configured retention window.
    ///
    /// Returns the number of tasks removed. A no-op when the store was
    /// built without a retention policy.
    pub async fn sweep(&self) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::zero());

        let mut expired = Vec::new();
        {
            let tasks = self.tasks.read().await;
            for (id, slot) in tasks.iter() {
                let task = slot.lock().await;
                let is_expired = task.status.state.is_terminal()
                    && task.status.timestamp.is_some_and(|ts| ts < cutoff);
                if is_expired {
                    expired.push(id.clone());
                }
            }
        }

        if expired.is_empty() {
            return 0;
        }

        let mut tasks = self.tasks.write().await;
        let mut removed = 0;
        for id in expired {
            if tasks.remove(&id).is_some() {
                removed += 1;
            }
        }
        tracing::debug!(removed, "swept expired terminal tasks");
        removed
    }

    /// Spawn a background sweeper that evicts expired tasks every `every`.
    pub fn start_sweeper(store: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                store.sweep().await;
            }
        })
    }

    async fn slot(&self, task_id: &str) -> AgentResult<Arc<Mutex<Task>>> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| AgentError::TaskNotFound {
                task_id: task_id.to_string(),
            })
    }

    fn transition_error(task: &Task, to: TaskState) -> AgentError {
        AgentError::InvalidTaskStateTransition {
            task_id: task.id.clone(),
            from: task.status.state.to_string(),
            to: to.to_string(),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn upsert(&self, params: &TaskSendParams) -> AgentResult<Task> {
        // Fast path: the task already exists, mutate it under its own lock.
        let existing = self.tasks.read().await.get(&params.id).cloned();

        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut tasks = self.tasks.write().await;
                // Re-check under the write lock: a concurrent upsert may
                // have created the entry between the two lock acquisitions.
                match tasks.get(&params.id) {
                    Some(slot) => slot.clone(),
                    None => {
                        let task = Task::submitted(
                            params.id.clone(),
                            params.session_id.clone(),
                            params.message.clone(),
                        );
                        let snapshot = task.clone();
                        tasks.insert(params.id.clone(), Arc::new(Mutex::new(task)));
                        return Ok(snapshot);
                    }
                }
            }
        };

        let mut task = slot.lock().await;
        if !task.status.state.accepts_input() {
            // History is immutable once a task has failed or been canceled.
            return Err(Self::transition_error(&task, task.status.state));
        }
        task.history.push(params.message.clone());
        Ok(task.clone())
    }

    async fn claim(&self, params: &TaskSendParams) -> AgentResult<Task> {
        let existing = self.tasks.read().await.get(&params.id).cloned();

        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut tasks = self.tasks.write().await;
                // Re-check under the write lock, same as upsert.
                match tasks.get(&params.id) {
                    Some(slot) => slot.clone(),
                    None => {
                        let mut task = Task::submitted(
                            params.id.clone(),
                            params.session_id.clone(),
                            params.message.clone(),
                        );
                        task.status = TaskStatus::new(TaskState::Working);
                        let snapshot = task.clone();
                        tasks.insert(params.id.clone(), Arc::new(Mutex::new(task)));
                        return Ok(snapshot);
                    }
                }
            }
        };

        let mut task = slot.lock().await;
        match task.status.state {
            // A completed task reopens for a follow-up turn; the append and
            // the transition happen in one critical section.
            TaskState::Completed => {
                task.history.push(params.message.clone());
                task.status = TaskStatus::new(TaskState::Working);
                Ok(task.clone())
            }
            // In-flight means another request owns the id; failed and
            // canceled tasks are immutable. Either way nothing was mutated.
            _ => Err(Self::transition_error(&task, TaskState::Working)),
        }
    }

    async fn get(&self, task_id: &str) -> AgentResult<Task> {
        let slot = self.slot(task_id).await?;
        let task = slot.lock().await;
        Ok(task.clone())
    }

    async fn update_status(&self, task_id: &str, state: TaskState) -> AgentResult<Task> {
        let slot = self.slot(task_id).await?;
        let mut task = slot.lock().await;
        if !task.status.state.can_transition_to(state) {
            return Err(Self::transition_error(&task, state));
        }
        task.status = TaskStatus::new(state);
        Ok(task.clone())
    }

    async fn append_message(&self, task_id: &str, message: Message) -> AgentResult<()> {
        let slot = self.slot(task_id).await?;
        let mut task = slot.lock().await;
        if !task.status.state.accepts_input() {
            return Err(Self::transition_error(&task, task.status.state));
        }
        task.history.push(message);
        Ok(())
    }

    async fn finalize(
        &self,
        task_id: &str,
        state: TaskState,
        history_message: Option<Message>,
        status_message: Option<Message>,
    ) -> AgentResult<Task> {
        let slot = self.slot(task_id).await?;
        let mut task = slot.lock().await;
        if !task.status.state.can_transition_to(state) {
            return Err(Self::transition_error(&task, state));
        }
        // Status and history change inside one critical section so no
        // reader observes a terminal status with missing history.
        if let Some(message) = history_message {
            task.history.push(message);
        }
        task.status = match status_message {
            Some(message) => TaskStatus::with_message(state, message),
            None => TaskStatus::new(state),
        };
        Ok(task.clone())
    }

    async fn remove(&self, task_id: &str) -> AgentResult<()> {
        self.tasks.write().await.remove(task_id);
        Ok(())
    }
}
