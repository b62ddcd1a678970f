//! Domain model for balances and transactions.

mod balance;
mod error;
mod transaction;

pub use balance::Balance;
pub use error::LedgerDomainError;
pub use transaction::{
    PersistedTransactionData, Transaction, TransactionId, TransactionStatus, TransactionType,
    TransferOrder,
};
