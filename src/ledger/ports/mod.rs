//! Port contracts for ledger persistence.

mod repository;

pub use repository::{LedgerRepository, LedgerRepositoryError, LedgerRepositoryResult};

#[cfg(test)]
pub use repository::MockLedgerRepository;
