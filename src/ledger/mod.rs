//! Balance ledger and transaction log.
//!
//! Every balance mutation goes through a [`domain::TransferOrder`] applied by
//! the repository in one unit of work: both balances are locked, the sender
//! is checked for funds, a transaction row is written and completed, and the
//! whole operation commits or rolls back together.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
