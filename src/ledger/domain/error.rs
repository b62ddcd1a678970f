//! Error types for ledger validation.

use crate::error::{Classify, ErrorKind};
use crate::identity::UserId;
use crate::money::Amount;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned while building or applying transfers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerDomainError {
    /// Sender and receiver are the same user.
    #[error("user {0} cannot transfer to themselves")]
    SelfTransfer(UserId),

    /// The sender's balance does not cover the amount.
    #[error("user {user_id} has {available} but {requested} was requested")]
    InsufficientFunds {
        /// Debited user.
        user_id: UserId,
        /// Balance at the time of the attempt.
        available: Decimal,
        /// Requested amount.
        requested: Amount,
    },

    /// A balance amount is negative.
    #[error("balance of user {user_id} cannot be negative: {amount}")]
    NegativeBalance {
        /// Balance owner.
        user_id: UserId,
        /// Offending amount.
        amount: Decimal,
    },

    /// A persisted transaction type id is unknown.
    #[error("unknown transaction type id: {0}")]
    UnknownTransactionType(i16),

    /// A persisted transaction status id is unknown.
    #[error("unknown transaction status id: {0}")]
    UnknownTransactionStatus(i16),
}

impl Classify for LedgerDomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::SelfTransfer(_)
            | Self::NegativeBalance { .. }
            | Self::UnknownTransactionType(_)
            | Self::UnknownTransactionStatus(_) => ErrorKind::Validation,
        }
    }
}
