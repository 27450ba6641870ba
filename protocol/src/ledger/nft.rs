//! # NFT Collection
//!
//! An owner-of registry for one collection. Holding custody of an NFT means
//! being the address recorded against its id; there is nothing else to it.
//! Per-holder counts are kept alongside so `balance_of` is a lookup, not a
//! scan.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::{LedgerError, TokenId};
use crate::address::Address;

/// Ownership records of one NFT collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftCollection {
    address: Address,
    symbol: String,
    /// `token_id -> owner`, ordered so listings are stable.
    owners: BTreeMap<TokenId, Address>,
    /// `holder -> number of tokens held`.
    holdings: HashMap<Address, u64>,
}

impl NftCollection {
    /// Creates an empty collection.
    pub fn new(address: Address, symbol: &str) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            owners: BTreeMap::new(),
            holdings: HashMap::new(),
        }
    }

    /// Returns the collection address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the collection symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the owner of `token_id`, or `None` if it was never minted.
    pub fn owner_of(&self, token_id: TokenId) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    /// Returns how many tokens `holder` owns.
    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.holdings.get(holder).copied().unwrap_or(0)
    }

    /// Returns the ids owned by `holder`, ascending.
    pub fn tokens_of(&self, holder: &Address) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == holder)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns the number of minted tokens.
    pub fn total_minted(&self) -> usize {
        self.owners.len()
    }

    /// Mints `token_id` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] for the zero address and
    /// [`LedgerError::AlreadyMinted`] if the id is taken.
    pub fn mint(&mut self, token_id: TokenId, to: &Address) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if self.owners.contains_key(&token_id) {
            return Err(LedgerError::AlreadyMinted {
                collection: self.address,
                token_id,
            });
        }
        self.owners.insert(token_id, *to);
        *self.holdings.entry(*to).or_insert(0) += 1;
        Ok(())
    }

    /// Moves `token_id` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `to` is the zero address.
    /// - [`LedgerError::NonexistentToken`] if the id was never minted.
    /// - [`LedgerError::NotOwner`] if `from` does not own the id.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let owner = self
            .owners
            .get(&token_id)
            .copied()
            .ok_or(LedgerError::NonexistentToken {
                collection: self.address,
                token_id,
            })?;
        if owner != *from {
            return Err(LedgerError::NotOwner {
                collection: self.address,
                token_id,
                caller: *from,
                owner,
            });
        }
        if from == to {
            return Ok(());
        }

        self.owners.insert(token_id, *to);
        if let Some(count) = self.holdings.get_mut(from) {
            *count -= 1;
            if *count == 0 {
                self.holdings.remove(from);
            }
        }
        *self.holdings.entry(*to).or_insert(0) += 1;
        Ok(())
    }
}
