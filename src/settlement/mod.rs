//! Task settlement: accepting a task and paying its reward.
//!
//! The status change and the payout commit separately. A payout that fails
//! after a successful accept leaves a `Completed` task with no settling
//! transaction; [`TaskSettlementService::unsettled_tasks`] finds those and
//! [`TaskSettlementService::reconcile`] retries them. The ledger refuses a
//! second completed payout for the same task, so retries never pay twice.

mod service;

pub use service::{
    FailedSettlement, ReconciliationReport, Settlement, SettlementError, SettlementResult,
    TaskSettlementService,
};

#[cfg(test)]
mod tests;
