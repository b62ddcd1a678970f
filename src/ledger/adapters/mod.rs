//! Adapter implementations of the ledger repository port.

pub mod memory;
pub mod postgres;
