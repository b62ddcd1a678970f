//! Repository port for balances and the transaction log.

use crate::error::{Classify, ErrorKind};
use crate::identity::UserId;
use crate::ledger::domain::{Balance, LedgerDomainError, Transaction, TransferOrder};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for ledger repository operations.
pub type LedgerRepositoryResult<T> = Result<T, LedgerRepositoryError>;

/// Ledger persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Creates a zero balance for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerRepositoryError::DuplicateBalance`] when the user
    /// already has a balance.
    async fn open_balance(&self, user_id: UserId) -> LedgerRepositoryResult<Balance>;

    /// Returns the balance of `user_id`, or `None` when it was never opened.
    async fn find_balance(&self, user_id: UserId) -> LedgerRepositoryResult<Option<Balance>>;

    /// Executes a transfer as one unit of work.
    ///
    /// Implementations lock both balances in ascending user id order,
    /// refuse the order when the sender cannot cover it, then record a
    /// `Pending` transaction, debit, credit and mark it `Completed` before
    /// committing. Nothing is persisted on failure.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerRepositoryError::BalanceNotFound`] when either party
    /// has no balance, [`LedgerRepositoryError::AlreadySettled`] when the
    /// order settles a task that already has a completed payout, and
    /// [`LedgerRepositoryError::Rejected`] for insufficient funds.
    async fn transfer(&self, order: TransferOrder) -> LedgerRepositoryResult<Transaction>;

    /// Returns every transaction where `user_id` is sender or receiver, in
    /// storage order.
    async fn transactions_for_user(
        &self,
        user_id: UserId,
    ) -> LedgerRepositoryResult<Vec<Transaction>>;

    /// Returns the completed transaction settling `task_id`, if any.
    async fn find_settlement(&self, task_id: TaskId)
    -> LedgerRepositoryResult<Option<Transaction>>;

    /// Returns up to `limit` balances, largest first, ties by user id.
    async fn top_balances(&self, limit: usize) -> LedgerRepositoryResult<Vec<Balance>>;
}

/// Errors returned by ledger repository implementations.
#[derive(Debug, Clone, Error)]
pub enum LedgerRepositoryError {
    /// A balance already exists for the user.
    #[error("balance already exists for user {0}")]
    DuplicateBalance(UserId),

    /// No balance exists for the user.
    #[error("no balance for user {0}")]
    BalanceNotFound(UserId),

    /// The task already has a completed payout.
    #[error("task {0} is already settled")]
    AlreadySettled(TaskId),

    /// The domain refused the transfer.
    #[error(transparent)]
    Rejected(#[from] LedgerDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl LedgerRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl Classify for LedgerRepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateBalance(_) | Self::AlreadySettled(_) => ErrorKind::Conflict,
            Self::BalanceNotFound(_) => ErrorKind::NotFound,
            Self::Rejected(err) => err.kind(),
            Self::Persistence(_) => ErrorKind::Storage,
        }
    }
}
