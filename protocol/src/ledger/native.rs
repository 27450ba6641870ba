//! # Native Coin Ledger
//!
//! Base-currency balances keyed by address. Unlike token balances these move
//! at the ledger level, not through a contract call, and a recipient contract
//! can refuse an incoming payment. [`NativeLedger::set_rejects_payments`]
//! models such a recipient.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{Amount, LedgerError};
use crate::address::Address;
use crate::config::NATIVE_ASSET;

/// Native coin balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NativeLedger {
    balances: HashMap<Address, Amount>,
    /// Accounts that refuse incoming native payments.
    rejecting: HashSet<Address>,
}

impl NativeLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the native balance of `holder`.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Returns the sum of all balances.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the sum exceeds `u128::MAX`,
    /// which individually valid balances can reach.
    pub fn total_issued(&self) -> Result<Amount, LedgerError> {
        self.balances
            .values()
            .try_fold(0, |total: Amount, balance| total.checked_add(*balance))
            .ok_or(LedgerError::Overflow(NATIVE_ASSET))
    }

    /// Credits `amount` out of thin air. Genesis allocation and test faucets
    /// only; returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] for the zero address and
    /// [`LedgerError::Overflow`] if the balance would exceed `u128::MAX`.
    pub fn credit(&mut self, to: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let balance = self.balance_of(to);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(NATIVE_ASSET))?;
        self.balances.insert(*to, new_balance);
        Ok(new_balance)
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `to` is the zero address.
    /// - [`LedgerError::PaymentRejected`] if `to` refuses native payments.
    /// - [`LedgerError::InsufficientBalance`] if `from` holds less than `amount`.
    /// - [`LedgerError::Overflow`] if the recipient balance would overflow.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if self.rejecting.contains(to) {
            return Err(LedgerError::PaymentRejected(*to));
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: NATIVE_ASSET,
                holder: *from,
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(NATIVE_ASSET))?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    /// Marks `account` as refusing (or accepting again) native payments.
    pub fn set_rejects_payments(&mut self, account: &Address, rejects: bool) {
        if rejects {
            self.rejecting.insert(*account);
        } else {
            self.rejecting.remove(account);
        }
    }

    /// Returns `true` if `account` refuses native payments.
    pub fn rejects_payments(&self, account: &Address) -> bool {
        self.rejecting.contains(account)
    }
}
