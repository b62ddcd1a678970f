//! Transactions recorded for every balance movement.

use super::LedgerDomainError;
use crate::identity::UserId;
use crate::money::Amount;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-generated identifier of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Wraps a store-generated identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of money movement.
///
/// Orders placed through this crate are always [`TransactionType::Transfer`];
/// the other kinds are written by shop and funding tooling and are only read
/// back here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// User-to-user transfer, including task payouts.
    Transfer,
    /// Purchase from a shop.
    Purchase,
    /// Funds entering the system.
    Deposit,
    /// Reversal of an earlier purchase.
    Refund,
}

impl TransactionType {
    const ALL: [Self; 4] = [Self::Transfer, Self::Purchase, Self::Deposit, Self::Refund];

    /// Returns the persisted type identifier.
    #[must_use]
    pub const fn id(self) -> i16 {
        match self {
            Self::Transfer => 1,
            Self::Purchase => 2,
            Self::Deposit => 3,
            Self::Refund => 4,
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Purchase => "purchase",
            Self::Deposit => "deposit",
            Self::Refund => "refund",
        }
    }

    /// Resolves a persisted type identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerDomainError::UnknownTransactionType`] for unknown ids.
    pub fn from_id(id: i16) -> Result<Self, LedgerDomainError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or(LedgerDomainError::UnknownTransactionType(id))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded but balances not yet moved.
    Pending,
    /// Balances moved; immutable from here on.
    Completed,
    /// Abandoned without moving balances.
    Cancelled,
}

impl TransactionStatus {
    const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::Cancelled];

    /// Returns the persisted status identifier.
    #[must_use]
    pub const fn id(self) -> i16 {
        match self {
            Self::Pending => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Resolves a persisted status identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerDomainError::UnknownTransactionStatus`] for unknown ids.
    pub fn from_id(id: i16) -> Result<Self, LedgerDomainError> {
        Self::ALL
            .into_iter()
            .find(|status| status.id() == id)
            .ok_or(LedgerDomainError::UnknownTransactionStatus(id))
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated request to move money between two balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOrder {
    sender: UserId,
    receiver: UserId,
    amount: Amount,
    kind: TransactionType,
    task_id: Option<TaskId>,
    requested_at: DateTime<Utc>,
}

impl TransferOrder {
    /// Creates a plain transfer order stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerDomainError::SelfTransfer`] when sender and receiver
    /// are the same user.
    pub fn new(
        sender: UserId,
        receiver: UserId,
        amount: Amount,
        clock: &impl Clock,
    ) -> Result<Self, LedgerDomainError> {
        if sender == receiver {
            return Err(LedgerDomainError::SelfTransfer(sender));
        }
        Ok(Self {
            sender,
            receiver,
            amount,
            kind: TransactionType::Transfer,
            task_id: None,
            requested_at: clock.utc(),
        })
    }

    /// Marks the order as the payout for `task_id`.
    #[must_use]
    pub const fn for_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Returns the debited user.
    #[must_use]
    pub const fn sender(&self) -> UserId {
        self.sender
    }

    /// Returns the credited user.
    #[must_use]
    pub const fn receiver(&self) -> UserId {
        self.receiver
    }

    /// Returns the amount moved.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the transaction type.
    #[must_use]
    pub const fn kind(&self) -> TransactionType {
        self.kind
    }

    /// Returns the settled task, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the request timestamp.
    #[must_use]
    pub const fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Returns the two parties in the order their balances must be locked.
    #[must_use]
    pub fn lock_order(&self) -> [UserId; 2] {
        if self.sender < self.receiver {
            [self.sender, self.receiver]
        } else {
            [self.receiver, self.sender]
        }
    }

    /// Materializes the `Pending` transaction row for this order.
    #[must_use]
    pub const fn into_pending(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            sender_id: self.sender,
            receiver_id: self.receiver,
            amount: self.amount,
            kind: self.kind,
            status: TransactionStatus::Pending,
            task_id: self.task_id,
            created_at: self.requested_at,
        }
    }
}

/// Recorded money movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    sender_id: UserId,
    receiver_id: UserId,
    amount: Amount,
    kind: TransactionType,
    status: TransactionStatus,
    task_id: Option<TaskId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTransactionData {
    /// Persisted identifier.
    pub id: TransactionId,
    /// Debited user.
    pub sender_id: UserId,
    /// Credited user.
    pub receiver_id: UserId,
    /// Amount moved.
    pub amount: Amount,
    /// Transaction type.
    pub kind: TransactionType,
    /// Transaction status.
    pub status: TransactionStatus,
    /// Settled task, if any.
    pub task_id: Option<TaskId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Reconstructs a transaction from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTransactionData) -> Self {
        Self {
            id: data.id,
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            amount: data.amount,
            kind: data.kind,
            status: data.status,
            task_id: data.task_id,
            created_at: data.created_at,
        }
    }

    /// Returns the transaction identifier.
    #[must_use]
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the debited user.
    #[must_use]
    pub const fn sender_id(&self) -> UserId {
        self.sender_id
    }

    /// Returns the credited user.
    #[must_use]
    pub const fn receiver_id(&self) -> UserId {
        self.receiver_id
    }

    /// Returns the amount moved.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the transaction type.
    #[must_use]
    pub const fn kind(&self) -> TransactionType {
        self.kind
    }

    /// Returns the transaction status.
    #[must_use]
    pub const fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns the settled task, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether `user_id` is a party to this transaction.
    #[must_use]
    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// Returns whether this completed transaction settles `task_id`.
    #[must_use]
    pub fn settles(&self, task_id: TaskId) -> bool {
        self.status == TransactionStatus::Completed && self.task_id == Some(task_id)
    }

    /// Marks a pending transaction as completed.
    pub fn complete(&mut self) {
        if self.status == TransactionStatus::Pending {
            self.status = TransactionStatus::Completed;
        }
    }
}
