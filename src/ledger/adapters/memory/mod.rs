//! In-memory ledger adapter.

mod ledger;

pub use ledger::InMemoryLedgerRepository;
