//! `PostgreSQL` repository implementation for task lifecycle storage.

use super::models::{TaskRow, task_columns};
use crate::config::PgPool;
use crate::identity::UserId;
use crate::money::Amount;
use crate::task::{
    domain::{
        Audience, NewTask, PersistedTaskData, Task, TaskId, TaskName, TaskStatus, TaskTransition,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::{BigInt, Nullable, SmallInt, Text, Timestamptz};
use tracing::debug;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        debug!(error = %err, "task query failed");
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            let row = diesel::sql_query(concat!(
                "INSERT INTO tasks (name, amount, status_id, created_by, for_group_id, user_id, ",
                "created_at, updated_at) ",
                "VALUES ($1, CAST($2 AS NUMERIC), $3, $4, $5, $6, $7, $7) ",
                "RETURNING ",
                task_columns!(),
            ))
            .bind::<Text, _>(task.name().as_str())
            .bind::<Text, _>(task.amount().to_string())
            .bind::<SmallInt, _>(TaskStatus::InProgress.id())
            .bind::<BigInt, _>(task.created_by().value())
            .bind::<SmallInt, _>(task.audience().group_id())
            .bind::<Nullable<BigInt>, _>(task.audience().assignee().map(UserId::value))
            .bind::<Timestamptz, _>(task.created_at())
            .get_result::<TaskRow>(connection)?;
            row_to_task(row)
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = diesel::sql_query(concat!(
                "SELECT ",
                task_columns!(),
                " FROM tasks WHERE id = $1"
            ))
            .bind::<BigInt, _>(id.value())
            .get_result::<TaskRow>(connection)
            .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn transition(&self, transition: TaskTransition) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.transaction::<Task, TaskRepositoryError, _>(|tx| {
                let row = diesel::sql_query(concat!(
                    "SELECT ",
                    task_columns!(),
                    " FROM tasks WHERE id = $1 FOR UPDATE"
                ))
                .bind::<BigInt, _>(transition.task_id.value())
                .get_result::<TaskRow>(tx)
                .optional()?
                .ok_or(TaskRepositoryError::NotFound(transition.task_id))?;

                let mut task = row_to_task(row)?;
                task.apply(&transition)?;

                diesel::sql_query(concat!(
                    "UPDATE tasks SET status_id = $1, claimed_by = $2, updated_at = $3 ",
                    "WHERE id = $4"
                ))
                .bind::<SmallInt, _>(task.status().id())
                .bind::<Nullable<BigInt>, _>(task.claimed_by().map(UserId::value))
                .bind::<Timestamptz, _>(task.updated_at())
                .bind::<BigInt, _>(task.id().value())
                .execute(tx)?;

                Ok(task)
            })
        })
        .await
    }

    async fn list_for_user(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT ",
                task_columns!(),
                " FROM tasks WHERE user_id = $1 OR for_group_id = $2 ",
                "ORDER BY created_at DESC, id DESC"
            ))
            .bind::<BigInt, _>(user_id.value())
            .bind::<SmallInt, _>(Audience::ALL_GROUP_ID)
            .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_for_creator(&self, admin_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT ",
                task_columns!(),
                " FROM tasks WHERE created_by = $1 ORDER BY created_at DESC, id DESC"
            ))
            .bind::<BigInt, _>(admin_id.value())
            .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        name,
        amount,
        status_id,
        created_by,
        for_group_id,
        user_id,
        claimed_by,
        created_at,
        updated_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::new(id),
        name: TaskName::new(name).map_err(TaskRepositoryError::persistence)?,
        amount: amount
            .parse::<Amount>()
            .map_err(TaskRepositoryError::persistence)?,
        status: TaskStatus::from_id(status_id).map_err(TaskRepositoryError::persistence)?,
        created_by: UserId::new(created_by),
        audience: Audience::from_parts(for_group_id, user_id)
            .map_err(TaskRepositoryError::persistence)?,
        claimed_by: claimed_by.map(UserId::new),
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}
