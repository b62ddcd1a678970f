//! Transaction service: the only entry point that mutates balances.

use crate::error::{Classify, ErrorKind};
use crate::identity::UserId;
use crate::ledger::{
    domain::{Balance, LedgerDomainError, Transaction, TransferOrder},
    ports::{LedgerRepository, LedgerRepositoryError},
};
use crate::money::{Amount, AmountError};
use crate::task::domain::TaskId;
use mockable::Clock;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for ledger operations.
#[derive(Debug, Error)]
pub enum TransactionServiceError {
    /// The transfer request is invalid.
    #[error(transparent)]
    Domain(#[from] LedgerDomainError),

    /// The amount is not strictly positive.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// The user has no balance.
    #[error("no balance for user {0}")]
    BalanceNotFound(UserId),

    /// Repository operation failed.
    #[error("{operation} failed: {source}")]
    Repository {
        /// Service operation that issued the failing call.
        operation: &'static str,
        /// Underlying repository error.
        #[source]
        source: LedgerRepositoryError,
    },
}

impl Classify for TransactionServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Amount(_) => ErrorKind::Validation,
            Self::BalanceNotFound(_) => ErrorKind::NotFound,
            Self::Repository { source, .. } => source.kind(),
        }
    }
}

/// Result type for transaction service operations.
pub type TransactionServiceResult<T> = Result<T, TransactionServiceError>;

fn repository_error(
    operation: &'static str,
) -> impl FnOnce(LedgerRepositoryError) -> TransactionServiceError {
    move |source| TransactionServiceError::Repository { operation, source }
}

/// Leaderboard size used until [`TransactionService::with_leaderboard_limit`]
/// overrides it.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Orchestrates balance creation, transfers and ledger queries.
#[derive(Clone)]
pub struct TransactionService<L, C>
where
    L: LedgerRepository,
    C: Clock + Send + Sync,
{
    ledger: Arc<L>,
    clock: Arc<C>,
    leaderboard_limit: usize,
}

impl<L, C> TransactionService<L, C>
where
    L: LedgerRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new transaction service.
    #[must_use]
    pub const fn new(ledger: Arc<L>, clock: Arc<C>) -> Self {
        Self {
            ledger,
            clock,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }

    /// Caps the number of balances a leaderboard query may return.
    #[must_use]
    pub const fn with_leaderboard_limit(mut self, limit: usize) -> Self {
        self.leaderboard_limit = limit;
        self
    }

    /// Opens the zero balance of a newly registered user.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict`-kind error when the balance already exists.
    pub async fn open_balance(&self, user_id: UserId) -> TransactionServiceResult<Balance> {
        let balance = self
            .ledger
            .open_balance(user_id)
            .await
            .map_err(repository_error("open balance"))?;
        info!(user_id = %user_id, "balance opened");
        Ok(balance)
    }

    /// Returns a user's balance.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionServiceError::BalanceNotFound`] when the user has
    /// no balance.
    pub async fn balance_of(&self, user_id: UserId) -> TransactionServiceResult<Balance> {
        self.ledger
            .find_balance(user_id)
            .await
            .map_err(repository_error("get balance"))?
            .ok_or(TransactionServiceError::BalanceNotFound(user_id))
    }

    /// Moves `amount` from `sender` to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-positive amounts or self transfers,
    /// `InsufficientFunds` when the sender cannot cover the amount and
    /// `NotFound` when either party has no balance. Nothing is persisted on
    /// failure.
    pub async fn transfer(
        &self,
        sender: UserId,
        receiver: UserId,
        amount: Decimal,
    ) -> TransactionServiceResult<Transaction> {
        let order = TransferOrder::new(sender, receiver, Amount::new(amount)?, &*self.clock)?;
        self.execute(order).await
    }

    /// Pays `amount` from `sender` to `receiver` as the settlement of
    /// `task_id`.
    ///
    /// # Errors
    ///
    /// As [`TransactionService::transfer`], plus a `Conflict`-kind error when
    /// the task already has a completed payout.
    pub async fn settle_task(
        &self,
        task_id: TaskId,
        sender: UserId,
        receiver: UserId,
        amount: Amount,
    ) -> TransactionServiceResult<Transaction> {
        let order = TransferOrder::new(sender, receiver, amount, &*self.clock)?.for_task(task_id);
        self.execute(order).await
    }

    async fn execute(&self, order: TransferOrder) -> TransactionServiceResult<Transaction> {
        match self.ledger.transfer(order).await {
            Ok(transaction) => {
                info!(
                    transaction_id = %transaction.id(),
                    sender_id = %order.sender(),
                    receiver_id = %order.receiver(),
                    amount = %order.amount(),
                    task_id = ?order.task_id().map(TaskId::value),
                    "transfer completed"
                );
                Ok(transaction)
            }
            Err(source) => {
                let error = TransactionServiceError::Repository {
                    operation: "transfer",
                    source,
                };
                warn!(
                    sender_id = %order.sender(),
                    receiver_id = %order.receiver(),
                    amount = %order.amount(),
                    kind = %error.kind(),
                    error = %error,
                    "transfer refused"
                );
                Err(error)
            }
        }
    }

    /// Returns every transaction the user took part in, in storage order.
    ///
    /// # Errors
    ///
    /// Returns a `Storage`-kind error when the query fails.
    pub async fn user_transactions(
        &self,
        user_id: UserId,
    ) -> TransactionServiceResult<Vec<Transaction>> {
        self.ledger
            .transactions_for_user(user_id)
            .await
            .map_err(repository_error("list transactions"))
    }

    /// Returns the completed payout for `task_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns a `Storage`-kind error when the query fails.
    pub async fn settlement_of(
        &self,
        task_id: TaskId,
    ) -> TransactionServiceResult<Option<Transaction>> {
        self.ledger
            .find_settlement(task_id)
            .await
            .map_err(repository_error("find settlement"))
    }

    /// Returns the richest balances, ties broken by user id.
    ///
    /// `limit` defaults to, and is capped by, the configured leaderboard
    /// limit.
    ///
    /// # Errors
    ///
    /// Returns a `Storage`-kind error when the query fails.
    pub async fn leaderboard(
        &self,
        limit: Option<usize>,
    ) -> TransactionServiceResult<Vec<Balance>> {
        let row_limit = limit.map_or(self.leaderboard_limit, |requested| {
            requested.min(self.leaderboard_limit)
        });
        self.ledger
            .top_balances(row_limit)
            .await
            .map_err(repository_error("leaderboard"))
    }
}
