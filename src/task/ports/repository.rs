//! Repository port for task persistence, lookup and atomic transitions.

use crate::identity::UserId;
use crate::task::domain::{NewTask, Task, TaskDomainError, TaskId, TaskTransition};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and returns it with its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the insert fails.
    async fn store(&self, task: NewTask) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Applies a transition atomically.
    ///
    /// Implementations must lock the task, evaluate
    /// [`Task::apply`] against the locked state and persist the result in
    /// the same unit of work, so that two racing transitions on one task
    /// serialize and the loser observes the winner's status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for unknown tasks and
    /// [`TaskRepositoryError::Rejected`] when the domain refuses the
    /// transition.
    async fn transition(&self, transition: TaskTransition) -> TaskRepositoryResult<Task>;

    /// Returns tasks assigned to `user_id` or broadcast to all users,
    /// newest first.
    async fn list_for_user(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks created by `admin_id`, newest first.
    async fn list_for_creator(&self, admin_id: UserId) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The domain refused the requested transition.
    #[error(transparent)]
    Rejected(#[from] TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
