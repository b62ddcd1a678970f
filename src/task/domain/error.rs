//! Error types for task domain validation and transitions.

use super::{TaskAction, TaskId, TaskStatus};
use crate::error::{Classify, ErrorKind};
use crate::identity::UserId;
use thiserror::Error;

/// Errors returned while constructing or transitioning tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyName,

    /// The persisted audience columns violate the audience invariant.
    #[error("invalid audience: group {group_id} with assignee {user_id:?}")]
    InvalidAudience {
        /// Persisted audience group identifier.
        group_id: i16,
        /// Persisted assignee, if any.
        user_id: Option<i64>,
    },

    /// The actor is not allowed to perform the action on this task.
    #[error("principal {actor} may not {action} task {task_id}")]
    NotEnoughPermission {
        /// Target task.
        task_id: TaskId,
        /// Acting principal.
        actor: UserId,
        /// Attempted action.
        action: TaskAction,
    },

    /// Only administrators may create tasks.
    #[error("principal {0} may not create tasks")]
    CreateRequiresAdmin(UserId),

    /// Only administrators may list the tasks they created.
    #[error("principal {0} may not list created tasks")]
    ListingRequiresAdmin(UserId),

    /// The action is not legal from the task's current status.
    #[error("cannot {action} task {task_id} while it is {status}")]
    InvalidState {
        /// Target task.
        task_id: TaskId,
        /// Status at the time of the attempt.
        status: TaskStatus,
        /// Attempted action.
        action: TaskAction,
    },
}

impl Classify for TaskDomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyName | Self::InvalidAudience { .. } => ErrorKind::Validation,
            Self::NotEnoughPermission { .. }
            | Self::CreateRequiresAdmin(_)
            | Self::ListingRequiresAdmin(_) => ErrorKind::NotEnoughPermission,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
