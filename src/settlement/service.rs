//! Settlement service composing the task lifecycle with the ledger.

use crate::error::{Classify, ErrorKind};
use crate::identity::Principal;
use crate::ledger::{
    domain::Transaction,
    ports::LedgerRepository,
    services::{TransactionService, TransactionServiceError},
};
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::TaskRepository,
    services::{TaskLifecycleError, TaskLifecycleService},
};
use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// A completed task together with the transaction that paid for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// The accepted task.
    pub task: Task,
    /// The completed payout.
    pub transaction: Transaction,
}

/// A task whose payout could not be completed during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSettlement {
    /// Task left unsettled.
    pub task_id: TaskId,
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable failure.
    pub message: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Tasks paid during this pass.
    pub settled: Vec<TaskId>,
    /// Tasks that are still unpaid.
    pub failed: Vec<FailedSettlement>,
}

impl ReconciliationReport {
    /// Returns `true` when every unsettled task was paid.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Errors returned by settlement operations.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The task operation failed; nothing was paid.
    #[error(transparent)]
    Task(#[from] TaskLifecycleError),

    /// A ledger query failed.
    #[error(transparent)]
    Ledger(#[from] TransactionServiceError),

    /// The task was accepted but its payout failed; it stays `Completed`
    /// and unsettled until reconciled.
    #[error("task {task_id} was accepted but the payout failed: {source}")]
    PayoutFailed {
        /// Accepted task.
        task_id: TaskId,
        /// Ledger failure.
        #[source]
        source: TransactionServiceError,
    },

    /// The task has nobody to pay.
    #[error("task {0} has no payee")]
    MissingPayee(TaskId),
}

impl Classify for SettlementError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Task(err) => err.kind(),
            Self::Ledger(err) | Self::PayoutFailed { source: err, .. } => err.kind(),
            Self::MissingPayee(_) => ErrorKind::InvalidState,
        }
    }
}

/// Result type for settlement operations.
pub type SettlementResult<T> = Result<T, SettlementError>;

/// Accepts tasks and pays their rewards from the creating admin's balance.
#[derive(Clone)]
pub struct TaskSettlementService<R, L, C>
where
    R: TaskRepository,
    L: LedgerRepository,
    C: Clock + Send + Sync,
{
    tasks: TaskLifecycleService<R, C>,
    ledger: TransactionService<L, C>,
}

impl<R, L, C> TaskSettlementService<R, L, C>
where
    R: TaskRepository,
    L: LedgerRepository,
    C: Clock + Send + Sync,
{
    /// Creates a settlement service over the two underlying services.
    #[must_use]
    pub const fn new(tasks: TaskLifecycleService<R, C>, ledger: TransactionService<L, C>) -> Self {
        Self { tasks, ledger }
    }

    /// Accepts a submitted task and pays its reward to the payee.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Task`] when the accept is refused (nothing
    /// changes), or [`SettlementError::PayoutFailed`] when the task was
    /// accepted but the transfer failed.
    pub async fn accept_and_pay(
        &self,
        task_id: TaskId,
        admin: &Principal,
    ) -> SettlementResult<Settlement> {
        let task = self.tasks.accept(task_id, admin).await?;
        self.pay(task).await
    }

    /// Returns the admin's completed tasks that have no completed payout.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Task`] for non-admin callers and a
    /// `Storage`-kind error when a query fails.
    pub async fn unsettled_tasks(&self, admin: &Principal) -> SettlementResult<Vec<Task>> {
        let listing = self.tasks.list_for_admin(admin).await?;
        let mut unsettled = Vec::new();
        for task in listing.into_vec() {
            if task.status() != TaskStatus::Completed {
                continue;
            }
            if self.ledger.settlement_of(task.id()).await?.is_none() {
                unsettled.push(task);
            }
        }
        Ok(unsettled)
    }

    /// Retries the payout of every unsettled task created by `admin`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the unsettled tasks cannot be listed;
    /// individual payout failures are collected in the report.
    pub async fn reconcile(&self, admin: &Principal) -> SettlementResult<ReconciliationReport> {
        let mut report = ReconciliationReport::default();
        for task in self.unsettled_tasks(admin).await? {
            let task_id = task.id();
            match self.pay(task).await {
                Ok(_) => report.settled.push(task_id),
                Err(err) => report.failed.push(FailedSettlement {
                    task_id,
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            }
        }
        info!(
            admin_id = %admin.id(),
            settled = report.settled.len(),
            failed = report.failed.len(),
            "reconciliation finished"
        );
        Ok(report)
    }

    async fn pay(&self, task: Task) -> SettlementResult<Settlement> {
        let task_id = task.id();
        let payee = task.payee().ok_or(SettlementError::MissingPayee(task_id))?;
        match self
            .ledger
            .settle_task(task_id, task.created_by(), payee, task.amount())
            .await
        {
            Ok(transaction) => {
                info!(
                    task_id = %task_id,
                    payee_id = %payee,
                    transaction_id = %transaction.id(),
                    "task settled"
                );
                Ok(Settlement { task, transaction })
            }
            Err(source) => {
                warn!(
                    task_id = %task_id,
                    payee_id = %payee,
                    kind = %source.kind(),
                    error = %source,
                    "task payout failed"
                );
                Err(SettlementError::PayoutFailed { task_id, source })
            }
        }
    }
}
