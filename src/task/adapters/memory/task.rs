//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::identity::UserId;
use crate::task::{
    domain::{NewTask, Task, TaskId, TaskTransition},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// A single write lock covers each transition, which gives the same
/// serialization guarantee as a row lock in the database adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: BTreeMap<TaskId, Task>,
    last_id: i64,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Collects matching tasks newest first, breaking timestamp ties by id.
fn newest_first<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks.cloned().collect();
    selected.sort_by(|left, right| {
        right
            .created_at()
            .cmp(&left.created_at())
            .then_with(|| right.id().cmp(&left.id()))
    });
    selected
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.last_id += 1;
        let stored = task.into_task(TaskId::new(state.last_id));
        state.tasks.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn transition(&self, transition: TaskTransition) -> TaskRepositoryResult<Task> {
        let mut state = self.state.write().map_err(lock_error)?;
        let task = state
            .tasks
            .get_mut(&transition.task_id)
            .ok_or(TaskRepositoryError::NotFound(transition.task_id))?;

        // Work on a copy so a rejected transition leaves the stored task intact.
        let mut updated = task.clone();
        updated.apply(&transition)?;
        *task = updated.clone();
        Ok(updated)
    }

    async fn list_for_user(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(newest_first(
            state
                .tasks
                .values()
                .filter(|task| task.is_visible_to(user_id)),
        ))
    }

    async fn list_for_creator(&self, admin_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(newest_first(
            state
                .tasks
                .values()
                .filter(|task| task.created_by() == admin_id),
        ))
    }
}
