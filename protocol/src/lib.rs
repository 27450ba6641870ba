// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # GameVault Protocol: Addresses & Asset Ledgers
//!
//! The vault contracts never own balances themselves. Custody means being the
//! registered holder inside somebody else's ledger: the native coin ledger,
//! a fungible token contract, or an NFT collection. This crate provides those
//! collaborators as plain in-memory state machines so the contracts can be
//! driven end to end.
//!
//! ## Architecture
//!
//! - **address**: 20-byte identities with a hex text form. The zero address
//!   is reserved as the native-asset sentinel.
//! - **ledger**: native coin balances, fungible tokens, NFT collections, and
//!   the aggregate [`ledger::Ledger`] with staged (all-or-nothing) execution.
//! - **config**: protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. Amounts are `u128` in smallest units. 18-decimal tokens blow past
//!    `u64` at around 18 whole units, and game economies mint more than that.
//! 2. Every mutation checks before it writes. A failed transfer leaves the
//!    ledger exactly as it was.
//! 3. Every ledger type is serializable so world state can be snapshotted.

pub mod address;
pub mod config;
pub mod ledger;

pub use address::{Address, AddressError};
pub use ledger::{Amount, AssetKind, Ledger, LedgerError, TokenId};
