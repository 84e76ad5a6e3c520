//! Task lifecycle core: concurrency-safe storage plus the manager that
//! drives a task through its state machine.

mod in_memory_task_store;
mod task_manager;
mod task_store;

pub use in_memory_task_store::InMemoryTaskStore;
pub use task_manager::TaskManager;
pub use task_store::TaskStore;
