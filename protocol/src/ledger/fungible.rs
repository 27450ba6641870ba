//! # Fungible Token
//!
//! A token contract in its simplest useful form: a symbol, a display
//! precision, a total supply, and per-holder balances. The vault is a plain
//! holder here, never the issuer.
//!
//! Minting has no access control and no cap. Supply economics belong to the
//! token's own contract; this ledger only needs enough of it to fund
//! holders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Amount, LedgerError};
use crate::address::Address;

/// Supply and balances of one fungible token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FungibleToken {
    /// The contract address of this token.
    address: Address,
    /// Ticker symbol (e.g. "GT").
    symbol: String,
    /// Decimal places, display only.
    decimals: u8,
    /// Current total supply in smallest units.
    total_supply: Amount,
    /// Per-holder balances.
    balances: HashMap<Address, Amount>,
}

impl FungibleToken {
    /// Creates a token with zero supply.
    pub fn new(address: Address, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
        }
    }

    /// Returns the contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the display precision.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Returns the total supply.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Returns the balance of `holder`, or 0.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Mints `amount` to `to` and returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] when minting to the zero address
    /// and [`LedgerError::Overflow`] if supply would exceed `u128::MAX`.
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(self.address))?;
        // Cannot overflow: every balance is bounded by total supply.
        let new_balance = self.balance_of(to) + amount;

        self.total_supply = new_supply;
        self.balances.insert(*to, new_balance);
        Ok(new_balance)
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] if `to` is the zero address and
    /// [`LedgerError::InsufficientBalance`] if `from` holds less than `amount`.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: self.address,
                holder: *from,
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self.balance_of(to) + amount;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: Amount = 1_000_000_000_000_000_000;

    fn token() -> FungibleToken {
        FungibleToken::new(Address::from_label("GT"), "GT", 18)
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn mint_increases_supply_and_balance() {
        let mut t = token();
        t.mint(&addr("vault"), 100 * ONE).unwrap();
        assert_eq!(t.total_supply(), 100 * ONE);
        assert_eq!(t.balance_of(&addr("vault")), 100 * ONE);
        assert_eq!(t.symbol(), "GT");
        assert_eq!(t.decimals(), 18);
    }

    #[test]
    fn mint_to_zero_address_rejected() {
        let mut t = token();
        assert_eq!(t.mint(&Address::ZERO, 1), Err(LedgerError::ZeroAddress));
        assert_eq!(t.total_supply(), 0);
    }

    #[test]
    fn mint_supply_overflow_rejected() {
        let mut t = token();
        t.mint(&addr("a"), u128::MAX).unwrap();
        assert_eq!(
            t.mint(&addr("b"), 1),
            Err(LedgerError::Overflow(t.address()))
        );
        assert_eq!(t.balance_of(&addr("b")), 0);
    }

    #[test]
    fn transfer_moves_balance_and_keeps_supply() {
        let mut t = token();
        t.mint(&addr("vault"), 100 * ONE).unwrap();
        t.transfer(&addr("vault"), &addr("x"), 10 * ONE).unwrap();
        assert_eq!(t.balance_of(&addr("vault")), 90 * ONE);
        assert_eq!(t.balance_of(&addr("x")), 10 * ONE);
        assert_eq!(t.total_supply(), 100 * ONE);
    }

    #[test]
    fn transfer_more_than_balance_rejected() {
        let mut t = token();
        t.mint(&addr("vault"), 5).unwrap();
        let result = t.transfer(&addr("vault"), &addr("x"), 6);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: 5,
                requested: 6,
                ..
            })
        ));
        assert_eq!(t.balance_of(&addr("vault")), 5);
    }

    #[test]
    fn transfer_to_zero_address_rejected() {
        let mut t = token();
        t.mint(&addr("vault"), 5).unwrap();
        assert_eq!(
            t.transfer(&addr("vault"), &Address::ZERO, 1),
            Err(LedgerError::ZeroAddress)
        );
    }
}
