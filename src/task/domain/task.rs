//! Task aggregate root and the transition command applied to it.

use super::{Audience, TaskAction, TaskDomainError, TaskId, TaskName, TaskStatus};
use crate::identity::{Principal, UserId};
use crate::money::Amount;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A task that has been validated but not yet stored.
///
/// The store assigns the identifier; every new task starts in
/// [`TaskStatus::InProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    name: TaskName,
    amount: Amount,
    audience: Audience,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl NewTask {
    /// Creates a pending task authored by `created_by`.
    #[must_use]
    pub fn new(
        name: TaskName,
        amount: Amount,
        audience: Audience,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            name,
            amount,
            audience,
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the reward amount.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the task audience.
    #[must_use]
    pub const fn audience(&self) -> Audience {
        self.audience
    }

    /// Returns the authoring admin.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Materializes the stored task once the store has assigned an id.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            name: self.name,
            amount: self.amount,
            status: TaskStatus::InProgress,
            created_by: self.created_by,
            audience: self.audience,
            claimed_by: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    amount: Amount,
    status: TaskStatus,
    created_by: UserId,
    audience: Audience,
    claimed_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task name.
    pub name: TaskName,
    /// Persisted reward amount.
    pub amount: Amount,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted authoring admin.
    pub created_by: UserId,
    /// Persisted audience.
    pub audience: Audience,
    /// User who submitted a broadcast task, if any.
    pub claimed_by: Option<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Command asking the store to apply `action` on behalf of `actor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTransition {
    /// Target task.
    pub task_id: TaskId,
    /// Requested action.
    pub action: TaskAction,
    /// Principal performing the action.
    pub actor: Principal,
    /// Time the action was requested.
    pub at: DateTime<Utc>,
}

impl TaskTransition {
    /// Creates a transition command stamped with the current clock time.
    #[must_use]
    pub fn new(task_id: TaskId, action: TaskAction, actor: Principal, clock: &impl Clock) -> Self {
        Self {
            task_id,
            action,
            actor,
            at: clock.utc(),
        }
    }
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            amount: data.amount,
            status: data.status,
            created_by: data.created_by,
            audience: data.audience,
            claimed_by: data.claimed_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the reward amount.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the authoring admin.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the task audience.
    #[must_use]
    pub const fn audience(&self) -> Audience {
        self.audience
    }

    /// Returns the user who submitted a broadcast task, if any.
    #[must_use]
    pub const fn claimed_by(&self) -> Option<UserId> {
        self.claimed_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the user who gets paid once the task is accepted.
    ///
    /// Assigned tasks pay their assignee; broadcast tasks pay whoever
    /// submitted them.
    #[must_use]
    pub const fn payee(&self) -> Option<UserId> {
        match self.audience {
            Audience::AssignedUser(user_id) => Some(user_id),
            Audience::All => self.claimed_by,
        }
    }

    /// Returns whether `user_id` should see this task in their listing.
    #[must_use]
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        match self.audience {
            Audience::All => true,
            Audience::AssignedUser(assignee) => assignee == user_id,
        }
    }

    /// Applies a transition command after checking permissions and status.
    ///
    /// Permissions are derived from the stored task, never from the caller:
    /// only the creating admin may accept; only the assignee (or, for
    /// broadcast tasks, any user submitting it and thereafter its claimant)
    /// may request acceptance or decline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotEnoughPermission`] when the actor may
    /// not act on this task, or [`TaskDomainError::InvalidState`] when the
    /// current status does not allow the action. The task is unchanged on
    /// error.
    pub fn apply(&mut self, transition: &TaskTransition) -> Result<(), TaskDomainError> {
        let TaskTransition {
            action, actor, at, ..
        } = *transition;
        self.authorize(action, &actor)?;

        let target = action.target_status();
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidState {
                task_id: self.id,
                status: self.status,
                action,
            });
        }

        if action == TaskAction::RequestAcceptance && self.audience == Audience::All {
            self.claimed_by = Some(actor.id());
        }
        self.status = target;
        self.updated_at = at;
        Ok(())
    }

    fn authorize(&self, action: TaskAction, actor: &Principal) -> Result<(), TaskDomainError> {
        let permitted = match action {
            TaskAction::Accept => actor.is_admin() && actor.id() == self.created_by,
            TaskAction::RequestAcceptance => {
                actor.is_user()
                    && match self.audience {
                        Audience::AssignedUser(assignee) => assignee == actor.id(),
                        Audience::All => true,
                    }
            }
            TaskAction::Decline => actor.is_user() && self.payee() == Some(actor.id()),
        };

        if permitted {
            Ok(())
        } else {
            Err(TaskDomainError::NotEnoughPermission {
                task_id: self.id,
                actor: actor.id(),
                action,
            })
        }
    }
}
