//! # GameVault Contracts
//!
//! Custody logic for a game operator's treasury. The vault holds native coin,
//! fungible tokens, and NFTs on behalf of the game and releases them only on
//! the order of an authorized operator while risk control permits:
//!
//! - **Admin Registry**: the owner-managed set of withdraw admins.
//! - **Ownership**: single owner with direct or two-phase handoff.
//! - **Risk Control**: a swappable strategy consulted before every asset
//!   movement. The default one is a pause flag held by its own controller.
//! - **Game Vault**: single and batched withdrawals of every asset kind,
//!   executed all-or-nothing.
//! - **ABI**: the JSON call boundary that decodes and routes external calls.
//!
//! ## Design Principles
//!
//! 1. A failed call changes nothing. Batches run against a staged ledger and
//!    events are logged only on commit.
//! 2. Authority is checked at every entry point, never cached.
//! 3. The vault asks the strategy for a verdict and nothing more. It never
//!    reaches into strategy state.
//! 4. Every public type is serializable (serde) for scripts and audit logs.

pub mod abi;
pub mod admin;
pub mod events;
pub mod game_vault;
pub mod ownership;
pub mod risk_control;
pub mod withdrawal;

pub use abi::{decode, AddressResolver, CallContext, CallOutput, HexResolver, VaultCall};
pub use events::{EventLog, EventRecord, VaultEvent};
pub use game_vault::{ErrorKind, ExecutionReceipt, GameVault, OperatingMode, VaultError};
pub use risk_control::{DefaultRiskControlStrategy, RiskControlStrategy, StrategyRef};
pub use withdrawal::Withdrawal;
