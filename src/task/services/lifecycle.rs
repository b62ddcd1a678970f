//! Service layer enforcing the task state machine and permission rules.

use crate::error::{Classify, ErrorKind};
use crate::identity::{Principal, UserId};
use crate::money::{Amount, AmountError};
use crate::task::{
    domain::{
        Audience, NewTask, Task, TaskAction, TaskDomainError, TaskId, TaskName, TaskTransition,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    name: String,
    amount: Decimal,
    audience: Audience,
}

impl CreateTaskRequest {
    /// Creates a request; validation happens in [`TaskLifecycleService::create`].
    #[must_use]
    pub fn new(name: impl Into<String>, amount: Decimal, audience: Audience) -> Self {
        Self {
            name: name.into(),
            amount,
            audience,
        }
    }

    /// Creates a request for a task assigned to `user_id`.
    #[must_use]
    pub fn for_user(name: impl Into<String>, amount: Decimal, user_id: UserId) -> Self {
        Self::new(name, amount, Audience::AssignedUser(user_id))
    }

    /// Creates a request for a task offered to all users.
    #[must_use]
    pub fn for_all(name: impl Into<String>, amount: Decimal) -> Self {
        Self::new(name, amount, Audience::All)
    }
}

/// Result of a task listing.
///
/// An empty listing is an expected outcome rather than a failure, so it
/// gets its own variant instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListing {
    /// The query matched no tasks.
    NoTasks,
    /// Matching tasks, newest first.
    Tasks(Vec<Task>),
}

impl TaskListing {
    fn from_vec(tasks: Vec<Task>) -> Self {
        if tasks.is_empty() {
            Self::NoTasks
        } else {
            Self::Tasks(tasks)
        }
    }

    /// Returns `true` for [`TaskListing::NoTasks`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::NoTasks)
    }

    /// Returns the listed tasks as a slice (empty for `NoTasks`).
    #[must_use]
    pub fn as_slice(&self) -> &[Task] {
        match self {
            Self::NoTasks => &[],
            Self::Tasks(tasks) => tasks,
        }
    }

    /// Converts the listing into a vector, mapping `NoTasks` to empty.
    #[must_use]
    pub fn into_vec(self) -> Vec<Task> {
        match self {
            Self::NoTasks => Vec::new(),
            Self::Tasks(tasks) => tasks,
        }
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation or authorization failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The reward amount is invalid.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Repository operation failed.
    #[error("{operation} failed: {source}")]
    Repository {
        /// Service operation that issued the failing call.
        operation: &'static str,
        /// Underlying repository error.
        #[source]
        source: TaskRepositoryError,
    },
}

impl TaskLifecycleError {
    fn from_repository(operation: &'static str, source: TaskRepositoryError) -> Self {
        match source {
            TaskRepositoryError::NotFound(task_id) => Self::NotFound(task_id),
            TaskRepositoryError::Rejected(domain) => Self::Domain(domain),
            TaskRepositoryError::Persistence(_) => Self::Repository { operation, source },
        }
    }
}

impl Classify for TaskLifecycleError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Amount(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repository { .. } => ErrorKind::Storage,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task in `InProgress` on behalf of an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the principal is not an
    /// admin or the name is blank, [`TaskLifecycleError::Amount`] when the
    /// amount is not positive, and [`TaskLifecycleError::Repository`] when
    /// persistence fails.
    pub async fn create(
        &self,
        actor: &Principal,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        if !actor.is_admin() {
            warn!(actor_id = %actor.id(), "non-admin attempted to create a task");
            return Err(TaskDomainError::CreateRequiresAdmin(actor.id()).into());
        }
        let name = TaskName::new(request.name)?;
        let amount = Amount::new(request.amount)?;
        let new_task = NewTask::new(name, amount, request.audience, actor.id(), &*self.clock);

        let task = self
            .repository
            .store(new_task)
            .await
            .map_err(|err| TaskLifecycleError::from_repository("create task", err))?;
        info!(
            task_id = %task.id(),
            admin_id = %actor.id(),
            amount = %task.amount(),
            "task created"
        );
        Ok(task)
    }

    /// Fetches a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks.
    pub async fn get(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await
            .map_err(|err| TaskLifecycleError::from_repository("get task", err))?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Submits a task for approval (`InProgress → WaitingForAcceptance`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotEnoughPermission` or `InvalidState` kinds as
    /// described on [`TaskLifecycleService::transition`].
    pub async fn request_acceptance(
        &self,
        task_id: TaskId,
        actor: &Principal,
    ) -> TaskLifecycleResult<Task> {
        self.transition(task_id, TaskAction::RequestAcceptance, actor)
            .await
    }

    /// Approves a submitted task (`WaitingForAcceptance → Completed`).
    ///
    /// Only the creating admin may accept, and only once: a racing second
    /// call observes `Completed` and fails with `InvalidState`.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycleService::transition`].
    pub async fn accept(&self, task_id: TaskId, actor: &Principal) -> TaskLifecycleResult<Task> {
        self.transition(task_id, TaskAction::Accept, actor).await
    }

    /// Declines a task (any non-terminal status → `Cancelled`).
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycleService::transition`].
    pub async fn decline(&self, task_id: TaskId, actor: &Principal) -> TaskLifecycleResult<Task> {
        self.transition(task_id, TaskAction::Decline, actor).await
    }

    /// Applies `action` to a task through the repository's atomic transition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks,
    /// [`TaskLifecycleError::Domain`] wrapping `NotEnoughPermission` or
    /// `InvalidState`, or [`TaskLifecycleError::Repository`] on storage
    /// failure.
    pub async fn transition(
        &self,
        task_id: TaskId,
        action: TaskAction,
        actor: &Principal,
    ) -> TaskLifecycleResult<Task> {
        let command = TaskTransition::new(task_id, action, *actor, &*self.clock);
        match self.repository.transition(command).await {
            Ok(task) => {
                info!(
                    task_id = %task_id,
                    actor_id = %actor.id(),
                    action = %action,
                    status = %task.status(),
                    "task transitioned"
                );
                Ok(task)
            }
            Err(err) => {
                let error = TaskLifecycleError::from_repository(action.as_str(), err);
                warn!(
                    task_id = %task_id,
                    actor_id = %actor.id(),
                    action = %action,
                    kind = %error.kind(),
                    error = %error,
                    "task transition refused"
                );
                Err(error)
            }
        }
    }

    /// Lists tasks visible to the calling principal: assigned to them or
    /// offered to all.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn list_for_user(&self, actor: &Principal) -> TaskLifecycleResult<TaskListing> {
        let tasks = self
            .repository
            .list_for_user(actor.id())
            .await
            .map_err(|err| TaskLifecycleError::from_repository("list tasks for user", err))?;
        Ok(TaskListing::from_vec(tasks))
    }

    /// Lists tasks created by the calling administrator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for non-admin callers and
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn list_for_admin(&self, actor: &Principal) -> TaskLifecycleResult<TaskListing> {
        if !actor.is_admin() {
            return Err(TaskDomainError::ListingRequiresAdmin(actor.id()).into());
        }
        let tasks = self
            .repository
            .list_for_creator(actor.id())
            .await
            .map_err(|err| TaskLifecycleError::from_repository("list tasks for admin", err))?;
        Ok(TaskListing::from_vec(tasks))
    }
}
