//! `PostgreSQL` adapters for the ledger.

mod models;
mod repository;

pub use repository::PostgresLedgerRepository;
