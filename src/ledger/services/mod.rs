//! Application services for balances and transfers.

mod transactions;

pub use transactions::{
    DEFAULT_LEADERBOARD_LIMIT, TransactionService, TransactionServiceError,
    TransactionServiceResult,
};
