//! `PostgreSQL` repository implementation for the ledger.

use super::models::{BalanceRow, TransactionRow, transaction_columns};
use crate::config::PgPool;
use crate::identity::UserId;
use crate::ledger::{
    domain::{
        Balance, PersistedTransactionData, Transaction, TransactionId, TransactionStatus,
        TransactionType, TransferOrder,
    },
    ports::{LedgerRepository, LedgerRepositoryError, LedgerRepositoryResult},
};
use crate::money::Amount;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Nullable, SmallInt, Text, Timestamptz};
use rust_decimal::Decimal;
use tracing::debug;

/// `PostgreSQL`-backed ledger repository.
#[derive(Debug, Clone)]
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> LedgerRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> LedgerRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(LedgerRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(LedgerRepositoryError::persistence)?
    }
}

impl From<DieselError> for LedgerRepositoryError {
    fn from(err: DieselError) -> Self {
        debug!(error = %err, "ledger query failed");
        Self::persistence(err)
    }
}

fn lock_balance(connection: &mut PgConnection, user_id: UserId) -> LedgerRepositoryResult<Balance> {
    let row = diesel::sql_query(
        "SELECT user_id, amount::TEXT AS amount FROM balances WHERE user_id = $1 FOR UPDATE",
    )
    .bind::<BigInt, _>(user_id.value())
    .get_result::<BalanceRow>(connection)
    .optional()?
    .ok_or(LedgerRepositoryError::BalanceNotFound(user_id))?;
    row_to_balance(row)
}

fn adjust_balance(
    connection: &mut PgConnection,
    user_id: UserId,
    delta: Decimal,
) -> LedgerRepositoryResult<()> {
    diesel::sql_query(
        "UPDATE balances SET amount = amount + CAST($1 AS NUMERIC) WHERE user_id = $2",
    )
    .bind::<Text, _>(delta.to_string())
    .bind::<BigInt, _>(user_id.value())
    .execute(connection)?;
    Ok(())
}

fn execute_transfer(
    connection: &mut PgConnection,
    order: TransferOrder,
) -> LedgerRepositoryResult<Transaction> {
    if let Some(task_id) = order.task_id() {
        if find_settlement_row(connection, task_id)?.is_some() {
            return Err(LedgerRepositoryError::AlreadySettled(task_id));
        }
    }

    let [first, second] = order.lock_order();
    let first_balance = lock_balance(connection, first)?;
    let second_balance = lock_balance(connection, second)?;
    let mut sender = if first_balance.user_id() == order.sender() {
        first_balance
    } else {
        second_balance
    };
    sender.debit(order.amount())?;

    let row = diesel::sql_query(concat!(
        "INSERT INTO transactions (sender_id, receiver_id, amount, type_id, status_id, task_id, ",
        "created_at) VALUES ($1, $2, CAST($3 AS NUMERIC), $4, $5, $6, $7) RETURNING ",
        transaction_columns!(),
    ))
    .bind::<BigInt, _>(order.sender().value())
    .bind::<BigInt, _>(order.receiver().value())
    .bind::<Text, _>(order.amount().to_string())
    .bind::<SmallInt, _>(order.kind().id())
    .bind::<SmallInt, _>(TransactionStatus::Pending.id())
    .bind::<Nullable<BigInt>, _>(order.task_id().map(TaskId::value))
    .bind::<Timestamptz, _>(order.requested_at())
    .get_result::<TransactionRow>(connection)?;
    let mut transaction = row_to_transaction(row)?;

    adjust_balance(connection, order.sender(), -order.amount().value())?;
    adjust_balance(connection, order.receiver(), order.amount().value())?;

    diesel::sql_query("UPDATE transactions SET status_id = $1 WHERE id = $2")
        .bind::<SmallInt, _>(TransactionStatus::Completed.id())
        .bind::<BigInt, _>(transaction.id().value())
        .execute(connection)
        .map_err(|err| match (err, order.task_id()) {
            (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), Some(task_id)) => {
                LedgerRepositoryError::AlreadySettled(task_id)
            }
            (other, _) => LedgerRepositoryError::from(other),
        })?;
    transaction.complete();
    Ok(transaction)
}

fn find_settlement_row(
    connection: &mut PgConnection,
    task_id: TaskId,
) -> LedgerRepositoryResult<Option<TransactionRow>> {
    let row = diesel::sql_query(concat!(
        "SELECT ",
        transaction_columns!(),
        " FROM transactions WHERE task_id = $1 AND status_id = $2"
    ))
    .bind::<BigInt, _>(task_id.value())
    .bind::<SmallInt, _>(TransactionStatus::Completed.id())
    .get_result::<TransactionRow>(connection)
    .optional()?;
    Ok(row)
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn open_balance(&self, user_id: UserId) -> LedgerRepositoryResult<Balance> {
        self.run_blocking(move |connection| {
            let row = diesel::sql_query(concat!(
                "INSERT INTO balances (user_id, amount) VALUES ($1, 0) ",
                "ON CONFLICT (user_id) DO NOTHING ",
                "RETURNING user_id, amount::TEXT AS amount"
            ))
            .bind::<BigInt, _>(user_id.value())
            .get_result::<BalanceRow>(connection)
            .optional()?
            .ok_or(LedgerRepositoryError::DuplicateBalance(user_id))?;
            row_to_balance(row)
        })
        .await
    }

    async fn find_balance(&self, user_id: UserId) -> LedgerRepositoryResult<Option<Balance>> {
        self.run_blocking(move |connection| {
            let row = diesel::sql_query(
                "SELECT user_id, amount::TEXT AS amount FROM balances WHERE user_id = $1",
            )
            .bind::<BigInt, _>(user_id.value())
            .get_result::<BalanceRow>(connection)
            .optional()?;
            row.map(row_to_balance).transpose()
        })
        .await
    }

    async fn transfer(&self, order: TransferOrder) -> LedgerRepositoryResult<Transaction> {
        self.run_blocking(move |connection| {
            connection.transaction::<Transaction, LedgerRepositoryError, _>(|tx| {
                execute_transfer(tx, order)
            })
        })
        .await
    }

    async fn transactions_for_user(
        &self,
        user_id: UserId,
    ) -> LedgerRepositoryResult<Vec<Transaction>> {
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT ",
                transaction_columns!(),
                " FROM transactions WHERE sender_id = $1 OR receiver_id = $1 ORDER BY id"
            ))
            .bind::<BigInt, _>(user_id.value())
            .load::<TransactionRow>(connection)?;
            rows.into_iter().map(row_to_transaction).collect()
        })
        .await
    }

    async fn find_settlement(
        &self,
        task_id: TaskId,
    ) -> LedgerRepositoryResult<Option<Transaction>> {
        self.run_blocking(move |connection| {
            find_settlement_row(connection, task_id)?
                .map(row_to_transaction)
                .transpose()
        })
        .await
    }

    async fn top_balances(&self, limit: usize) -> LedgerRepositoryResult<Vec<Balance>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT user_id, amount::TEXT AS amount FROM balances ",
                "ORDER BY amount DESC, user_id ASC LIMIT $1"
            ))
            .bind::<BigInt, _>(row_limit)
            .load::<BalanceRow>(connection)?;
            rows.into_iter().map(row_to_balance).collect()
        })
        .await
    }
}

fn row_to_balance(row: BalanceRow) -> LedgerRepositoryResult<Balance> {
    let amount = row
        .amount
        .parse::<Decimal>()
        .map_err(LedgerRepositoryError::persistence)?;
    Balance::new(UserId::new(row.user_id), amount).map_err(LedgerRepositoryError::persistence)
}

fn row_to_transaction(row: TransactionRow) -> LedgerRepositoryResult<Transaction> {
    let TransactionRow {
        id,
        sender_id,
        receiver_id,
        amount,
        type_id,
        status_id,
        task_id,
        created_at,
    } = row;

    let data = PersistedTransactionData {
        id: TransactionId::new(id),
        sender_id: UserId::new(sender_id),
        receiver_id: UserId::new(receiver_id),
        amount: amount
            .parse::<Amount>()
            .map_err(LedgerRepositoryError::persistence)?,
        kind: TransactionType::from_id(type_id).map_err(LedgerRepositoryError::persistence)?,
        status: TransactionStatus::from_id(status_id)
            .map_err(LedgerRepositoryError::persistence)?,
        task_id: task_id.map(TaskId::new),
        created_at,
    };
    Ok(Transaction::from_persisted(data))
}
