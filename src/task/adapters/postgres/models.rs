//! Diesel row models for task persistence.
//!
//! Amounts travel as text (`amount::TEXT`) and are parsed into
//! [`rust_decimal::Decimal`] so no Diesel numeric backend is required.

use chrono::{DateTime, Utc};
use diesel::QueryableByName;
use diesel::sql_types::{BigInt, Nullable, SmallInt, Text, Timestamptz};

/// Column list shared by every task query.
macro_rules! task_columns {
    () => {
        "id, name, amount::TEXT AS amount, status_id, created_by, for_group_id, user_id, \
         claimed_by, created_at, updated_at"
    };
}

pub(super) use task_columns;

/// Query result row for task records.
#[derive(Debug, Clone, QueryableByName)]
pub struct TaskRow {
    /// Store-generated task identifier.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    /// Task name.
    #[diesel(sql_type = Text)]
    pub name: String,
    /// Reward amount rendered as text.
    #[diesel(sql_type = Text)]
    pub amount: String,
    /// Lifecycle status identifier.
    #[diesel(sql_type = SmallInt)]
    pub status_id: i16,
    /// Authoring admin.
    #[diesel(sql_type = BigInt)]
    pub created_by: i64,
    /// Audience group identifier.
    #[diesel(sql_type = SmallInt)]
    pub for_group_id: i16,
    /// Assigned user for targeted tasks.
    #[diesel(sql_type = Nullable<BigInt>)]
    pub user_id: Option<i64>,
    /// Claimant of a broadcast task.
    #[diesel(sql_type = Nullable<BigInt>)]
    pub claimed_by: Option<i64>,
    /// Creation timestamp.
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last status change timestamp.
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
}
