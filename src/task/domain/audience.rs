//! Task audience: broadcast to everyone or assigned to one user.

use super::TaskDomainError;
use crate::identity::UserId;
use serde::{Deserialize, Serialize};

/// Who a task is offered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "user_id", rename_all = "snake_case")]
pub enum Audience {
    /// Any user may pick the task up.
    All,
    /// Only the named user may work on the task.
    AssignedUser(UserId),
}

impl Audience {
    /// Persisted group identifier for broadcast tasks.
    pub const ALL_GROUP_ID: i16 = 1;
    /// Persisted group identifier for assigned tasks.
    pub const ASSIGNED_GROUP_ID: i16 = 2;

    /// Returns the persisted group identifier.
    #[must_use]
    pub const fn group_id(self) -> i16 {
        match self {
            Self::All => Self::ALL_GROUP_ID,
            Self::AssignedUser(_) => Self::ASSIGNED_GROUP_ID,
        }
    }

    /// Returns the assigned user, if any.
    #[must_use]
    pub const fn assignee(self) -> Option<UserId> {
        match self {
            Self::All => None,
            Self::AssignedUser(user_id) => Some(user_id),
        }
    }

    /// Rebuilds an audience from its persisted columns.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAudience`] when the group and
    /// assignee columns disagree.
    pub fn from_parts(group_id: i16, user_id: Option<i64>) -> Result<Self, TaskDomainError> {
        match (group_id, user_id) {
            (Self::ALL_GROUP_ID, None) => Ok(Self::All),
            (Self::ASSIGNED_GROUP_ID, Some(id)) => Ok(Self::AssignedUser(UserId::new(id))),
            _ => Err(TaskDomainError::InvalidAudience { group_id, user_id }),
        }
    }
}
