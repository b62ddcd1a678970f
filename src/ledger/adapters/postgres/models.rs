//! Diesel row models for balances and transactions.

use chrono::{DateTime, Utc};
use diesel::QueryableByName;
use diesel::sql_types::{BigInt, Nullable, SmallInt, Text, Timestamptz};

/// Column list shared by every transaction query.
macro_rules! transaction_columns {
    () => {
        "id, sender_id, receiver_id, amount::TEXT AS amount, type_id, status_id, task_id, \
         created_at"
    };
}

pub(super) use transaction_columns;

/// Query result row for balances.
#[derive(Debug, Clone, QueryableByName)]
pub struct BalanceRow {
    /// Balance owner.
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    /// Current amount rendered as text.
    #[diesel(sql_type = Text)]
    pub amount: String,
}

/// Query result row for transactions.
#[derive(Debug, Clone, QueryableByName)]
pub struct TransactionRow {
    /// Store-generated identifier.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    /// Debited user.
    #[diesel(sql_type = BigInt)]
    pub sender_id: i64,
    /// Credited user.
    #[diesel(sql_type = BigInt)]
    pub receiver_id: i64,
    /// Amount rendered as text.
    #[diesel(sql_type = Text)]
    pub amount: String,
    /// Transaction type identifier.
    #[diesel(sql_type = SmallInt)]
    pub type_id: i16,
    /// Transaction status identifier.
    #[diesel(sql_type = SmallInt)]
    pub status_id: i16,
    /// Settled task, if any.
    #[diesel(sql_type = Nullable<BigInt>)]
    pub task_id: Option<i64>,
    /// Creation timestamp.
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
}
