//! Domain model for the task lifecycle.
//!
//! Tasks are created by administrators, worked on by users and approved by
//! their creator. All permission and state-machine rules live here so every
//! adapter applies the same checks inside its own locking scope.

mod audience;
mod error;
mod ids;
mod status;
mod task;

pub use audience::Audience;
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, TaskName};
pub use status::{TaskAction, TaskStatus};
pub use task::{NewTask, PersistedTaskData, Task, TaskTransition};
