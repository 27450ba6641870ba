//! # Asset Ledgers
//!
//! The external balance systems the vault holds custody in.
//!
//! ```text
//! native.rs    base-currency balances; recipients may refuse payment
//! fungible.rs  a fungible token contract: supply, balances, transfers
//! nft.rs       an NFT collection: owner-of mapping, per-holder counts
//! ```
//!
//! [`Ledger`] ties them together as the world state a vault call executes
//! against. Its [`Ledger::atomically`] runs a closure on a staged copy and
//! only swaps it in when the closure succeeds, which is how multi-leg
//! withdrawals get all-or-nothing semantics.

pub mod fungible;
pub mod native;
pub mod nft;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::address::Address;

pub use fungible::FungibleToken;
pub use native::NativeLedger;
pub use nft::NftCollection;

/// An amount in the smallest unit of its asset.
pub type Amount = u128;

/// Identifier of a single NFT within its collection.
pub type TokenId = u64;

/// Serde helper for [`Amount`] fields: written as decimal strings, read from
/// strings or plain integers.
///
/// JSON numbers stop being exact well below `u128::MAX`, and 18-decimal
/// amounts pass that point quickly. Strings survive every JSON toolchain.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Payout {
///     #[serde(with = "gamevault_protocol::ledger::amount_string")]
///     amount: Amount,
/// }
/// ```
pub mod amount_string {
    use super::Amount;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            Amount::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.parse::<Amount>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the ledgers. A failed operation never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No token or collection is deployed at this address.
    #[error("no asset deployed at {0}")]
    UnknownAsset(Address),

    /// The sender holds less than the amount being moved.
    #[error("insufficient balance of {asset} for {holder}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The asset being moved (zero address for native).
        asset: Address,
        /// The account being debited.
        holder: Address,
        /// What the account holds.
        available: Amount,
        /// What was requested.
        requested: Amount,
    },

    /// The sender is not the registered owner of the NFT.
    #[error("{caller} does not own token {token_id} of {collection} (owner {owner})")]
    NotOwner {
        /// The collection address.
        collection: Address,
        /// The token in question.
        token_id: TokenId,
        /// The account that tried to move it.
        caller: Address,
        /// The actual owner.
        owner: Address,
    },

    /// The NFT has never been minted.
    #[error("token {token_id} of {collection} does not exist")]
    NonexistentToken {
        /// The collection address.
        collection: Address,
        /// The unknown token.
        token_id: TokenId,
    },

    /// The NFT id is already taken.
    #[error("token {token_id} of {collection} is already minted")]
    AlreadyMinted {
        /// The collection address.
        collection: Address,
        /// The duplicate token.
        token_id: TokenId,
    },

    /// The zero address cannot receive or hold assets.
    #[error("the zero address cannot receive assets")]
    ZeroAddress,

    /// The recipient refuses native-coin payments.
    #[error("recipient {0} rejected the native payment")]
    PaymentRejected(Address),

    /// A balance or supply would exceed `u128::MAX`.
    #[error("amount overflow on {0}")]
    Overflow(Address),

    /// A contract is already deployed here, or the address is reserved.
    #[error("address {0} is already in use")]
    AddressInUse(Address),
}

// ---------------------------------------------------------------------------
// Asset classes
// ---------------------------------------------------------------------------

/// The class of asset found behind an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    /// The base currency, addressed through the zero-address sentinel.
    Native,
    /// A fungible token contract.
    Fungible,
    /// An NFT collection.
    NonFungible,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Native => write!(f, "Native"),
            AssetKind::Fungible => write!(f, "Fungible"),
            AssetKind::NonFungible => write!(f, "NonFungible"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The world state: native balances plus every deployed token and collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    native: NativeLedger,
    tokens: HashMap<Address, FungibleToken>,
    collections: HashMap<Address, NftCollection>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys a fungible token at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AddressInUse`] if the address is the zero
    /// address or already hosts a token or collection.
    pub fn deploy_token(
        &mut self,
        address: Address,
        symbol: &str,
        decimals: u8,
    ) -> Result<(), LedgerError> {
        self.check_free(address)?;
        self.tokens
            .insert(address, FungibleToken::new(address, symbol, decimals));
        tracing::debug!(%address, symbol, decimals, "token deployed");
        Ok(())
    }

    /// Deploys an NFT collection at `address`.
    ///
    /// # Errors
    ///
    /// Same as [`deploy_token`](Self::deploy_token).
    pub fn deploy_collection(&mut self, address: Address, symbol: &str) -> Result<(), LedgerError> {
        self.check_free(address)?;
        self.collections
            .insert(address, NftCollection::new(address, symbol));
        tracing::debug!(%address, symbol, "collection deployed");
        Ok(())
    }

    /// Returns the native coin ledger.
    pub fn native(&self) -> &NativeLedger {
        &self.native
    }

    /// Returns the native coin ledger mutably.
    pub fn native_mut(&mut self) -> &mut NativeLedger {
        &mut self.native
    }

    /// Returns the token deployed at `address`.
    pub fn token(&self, address: &Address) -> Option<&FungibleToken> {
        self.tokens.get(address)
    }

    /// Returns the token deployed at `address` mutably.
    pub fn token_mut(&mut self, address: &Address) -> Option<&mut FungibleToken> {
        self.tokens.get_mut(address)
    }

    /// Returns the collection deployed at `address`.
    pub fn collection(&self, address: &Address) -> Option<&NftCollection> {
        self.collections.get(address)
    }

    /// Returns the collection deployed at `address` mutably.
    pub fn collection_mut(&mut self, address: &Address) -> Option<&mut NftCollection> {
        self.collections.get_mut(address)
    }

    /// Classifies the asset behind `address`, or `None` if nothing is there.
    pub fn asset_kind(&self, address: &Address) -> Option<AssetKind> {
        if address.is_zero() {
            Some(AssetKind::Native)
        } else if self.tokens.contains_key(address) {
            Some(AssetKind::Fungible)
        } else if self.collections.contains_key(address) {
            Some(AssetKind::NonFungible)
        } else {
            None
        }
    }

    /// Returns what `holder` has of `asset`: a native or token amount, or the
    /// number of NFTs held for a collection. Unknown assets read as zero.
    pub fn balance_of(&self, asset: &Address, holder: &Address) -> Amount {
        match self.asset_kind(asset) {
            Some(AssetKind::Native) => self.native.balance_of(holder),
            Some(AssetKind::Fungible) => self
                .tokens
                .get(asset)
                .map(|t| t.balance_of(holder))
                .unwrap_or(0),
            Some(AssetKind::NonFungible) => self
                .collections
                .get(asset)
                .map(|c| Amount::from(c.balance_of(holder)))
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Moves a fungible amount: native when `asset` is the zero address,
    /// otherwise through the token deployed at `asset`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownAsset`] when `asset` is neither native nor
    /// a deployed token (collections included), plus whatever the underlying
    /// ledger rejects.
    pub fn transfer_fungible(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if asset.is_zero() {
            return self.native.transfer(from, to, amount);
        }
        self.tokens
            .get_mut(asset)
            .ok_or(LedgerError::UnknownAsset(*asset))?
            .transfer(from, to, amount)
    }

    /// Moves one NFT between holders.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownAsset`] if no collection lives at
    /// `collection`, plus the collection's own ownership errors.
    pub fn transfer_nft(
        &mut self,
        collection: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        self.collections
            .get_mut(collection)
            .ok_or(LedgerError::UnknownAsset(*collection))?
            .transfer(from, to, token_id)
    }

    /// Runs `f` against a staged copy of the ledger.
    ///
    /// The copy replaces `self` only when `f` returns `Ok`. On `Err` every
    /// mutation `f` made is discarded, no matter how far it got.
    pub fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Ledger) -> Result<T, E>,
    {
        let mut staged = self.clone();
        let out = f(&mut staged)?;
        *self = staged;
        Ok(out)
    }

    fn check_free(&self, address: Address) -> Result<(), LedgerError> {
        if address.is_zero() || self.asset_kind(&address).is_some() {
            return Err(LedgerError::AddressInUse(address));
        }
        Ok(())
    }
}
