//! In-memory repository for balances and transactions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::identity::UserId;
use crate::ledger::{
    domain::{Balance, Transaction, TransactionId, TransferOrder},
    ports::{LedgerRepository, LedgerRepositoryError, LedgerRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory ledger.
///
/// Each transfer runs under one write lock over balances and the log, so
/// partial effects are never observable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerRepository {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    balances: BTreeMap<UserId, Balance>,
    transactions: Vec<Transaction>,
}

impl InMemoryLedgerRepository {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a user's balance directly, opening it if needed.
    ///
    /// Intended for seeding fixtures; production balances only change
    /// through [`LedgerRepository::transfer`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerRepositoryError::Rejected`] for negative amounts.
    pub fn seed_balance(&self, user_id: UserId, amount: Decimal) -> LedgerRepositoryResult<()> {
        let balance = Balance::new(user_id, amount)?;
        let mut state = self.state.write().map_err(lock_error)?;
        state.balances.insert(user_id, balance);
        Ok(())
    }
}

fn lock_error(err: impl ToString) -> LedgerRepositoryError {
    LedgerRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn open_balance(&self, user_id: UserId) -> LedgerRepositoryResult<Balance> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.balances.contains_key(&user_id) {
            return Err(LedgerRepositoryError::DuplicateBalance(user_id));
        }
        let balance = Balance::zero(user_id);
        state.balances.insert(user_id, balance.clone());
        Ok(balance)
    }

    async fn find_balance(&self, user_id: UserId) -> LedgerRepositoryResult<Option<Balance>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.balances.get(&user_id).cloned())
    }

    async fn transfer(&self, order: TransferOrder) -> LedgerRepositoryResult<Transaction> {
        let mut guard = self.state.write().map_err(lock_error)?;
        let state = &mut *guard;

        if let Some(task_id) = order.task_id() {
            if state.transactions.iter().any(|tx| tx.settles(task_id)) {
                return Err(LedgerRepositoryError::AlreadySettled(task_id));
            }
        }

        let mut sender = state
            .balances
            .get(&order.sender())
            .cloned()
            .ok_or(LedgerRepositoryError::BalanceNotFound(order.sender()))?;
        let mut receiver = state
            .balances
            .get(&order.receiver())
            .cloned()
            .ok_or(LedgerRepositoryError::BalanceNotFound(order.receiver()))?;

        sender.debit(order.amount())?;
        receiver.credit(order.amount());

        let next_id = i64::try_from(state.transactions.len())
            .map_err(LedgerRepositoryError::persistence)?
            + 1;
        let mut transaction = order.into_pending(TransactionId::new(next_id));
        transaction.complete();

        state.balances.insert(sender.user_id(), sender);
        state.balances.insert(receiver.user_id(), receiver);
        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn transactions_for_user(
        &self,
        user_id: UserId,
    ) -> LedgerRepositoryResult<Vec<Transaction>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.involves(user_id))
            .cloned()
            .collect())
    }

    async fn find_settlement(
        &self,
        task_id: TaskId,
    ) -> LedgerRepositoryResult<Option<Transaction>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .transactions
            .iter()
            .find(|tx| tx.settles(task_id))
            .cloned())
    }

    async fn top_balances(&self, limit: usize) -> LedgerRepositoryResult<Vec<Balance>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut balances: Vec<Balance> = state.balances.values().cloned().collect();
        balances.sort_by(|left, right| {
            right
                .amount()
                .cmp(&left.amount())
                .then_with(|| left.user_id().cmp(&right.user_id()))
        });
        balances.truncate(limit);
        Ok(balances)
    }
}
