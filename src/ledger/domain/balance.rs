//! Per-user balance.

use super::LedgerDomainError;
use crate::identity::UserId;
use crate::money::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's spendable balance. Never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    user_id: UserId,
    amount: Decimal,
}

impl Balance {
    /// Opening balance for a newly registered user.
    #[must_use]
    pub const fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            amount: Decimal::ZERO,
        }
    }

    /// Reconstructs a balance from storage.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerDomainError::NegativeBalance`] for negative amounts.
    pub fn new(user_id: UserId, amount: Decimal) -> Result<Self, LedgerDomainError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(LedgerDomainError::NegativeBalance { user_id, amount });
        }
        Ok(Self {
            user_id,
            amount: amount.normalize(),
        })
    }

    /// Returns the balance owner.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the current amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns whether the balance covers `amount`.
    #[must_use]
    pub fn covers(&self, amount: Amount) -> bool {
        self.amount >= amount.value()
    }

    /// Removes `amount` from the balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerDomainError::InsufficientFunds`] and leaves the
    /// balance untouched when it does not cover `amount`.
    pub fn debit(&mut self, amount: Amount) -> Result<(), LedgerDomainError> {
        if !self.covers(amount) {
            return Err(LedgerDomainError::InsufficientFunds {
                user_id: self.user_id,
                available: self.amount,
                requested: amount,
            });
        }
        self.amount = (self.amount - amount.value()).normalize();
        Ok(())
    }

    /// Adds `amount` to the balance.
    pub fn credit(&mut self, amount: Amount) {
        self.amount = (self.amount + amount.value()).normalize();
    }
}
