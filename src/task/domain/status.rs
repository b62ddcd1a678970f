//! Task status state machine and the actions that drive it.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is open and being worked on.
    InProgress,
    /// The user has submitted the task for approval.
    WaitingForAcceptance,
    /// The creating admin approved the task.
    Completed,
    /// The task was declined.
    Cancelled,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::InProgress,
        Self::WaitingForAcceptance,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::WaitingForAcceptance => "waiting_for_acceptance",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns the persisted status identifier.
    #[must_use]
    pub const fn id(self) -> i16 {
        match self {
            Self::InProgress => 1,
            Self::WaitingForAcceptance => 2,
            Self::Completed => 3,
            Self::Cancelled => 4,
        }
    }

    /// Resolves a persisted status identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTaskStatusError`] for unknown identifiers.
    pub fn from_id(id: i16) -> Result<Self, ParseTaskStatusError> {
        Self::ALL
            .into_iter()
            .find(|status| status.id() == id)
            .ok_or_else(|| ParseTaskStatusError(id.to_string()))
    }

    /// Returns whether no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::InProgress,
                Self::WaitingForAcceptance | Self::Cancelled
            ) | (
                Self::WaitingForAcceptance,
                Self::Completed | Self::Cancelled
            )
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "in_progress" => Ok(Self::InProgress),
            "waiting_for_acceptance" => Ok(Self::WaitingForAcceptance),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Actions a principal can take on an existing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    /// A user submits the task for approval.
    RequestAcceptance,
    /// The creating admin approves a submitted task.
    Accept,
    /// A user gives up on the task.
    Decline,
}

impl TaskAction {
    /// Returns the status this action moves a task into.
    #[must_use]
    pub const fn target_status(self) -> TaskStatus {
        match self {
            Self::RequestAcceptance => TaskStatus::WaitingForAcceptance,
            Self::Accept => TaskStatus::Completed,
            Self::Decline => TaskStatus::Cancelled,
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestAcceptance => "request_acceptance",
            Self::Accept => "accept",
            Self::Decline => "decline",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
