//! # GameVault Contract
//!
//! Custody for a game operator's treasury: native coin, fungible tokens, and
//! NFTs, released only by the owner or a withdraw admin and only while the
//! risk control strategy permits.
//!
//! ## Call Pipeline
//!
//! Every withdrawal, single or batched, goes through the same steps:
//!
//! 1. **Privilege**: the caller must be the owner or a registered admin.
//! 2. **Shape**: batch sequences must line up, be non-empty, and stay under
//!    [`MAX_BATCH_LEGS`]; every leg needs a non-zero recipient and amount.
//! 3. **Execute**: against a staged copy of the ledger. Right before each
//!    leg's transfer the active strategy is asked for a verdict.
//! 4. **Commit**: only if every leg succeeded: the staged ledger replaces the
//!    live one and the staged events enter the log under one transaction id.
//!
//! A failure at any step returns an error and changes nothing: no balance,
//! no event, no partially applied batch.
//!
//! ## Re-entrancy
//!
//! Each call holds `&mut GameVault` and `&mut Ledger` from entry to commit.
//! Nothing else can touch either while a call is in flight, so a recipient
//! cannot re-enter and observe half-applied balances.
//!
//! ## Operating Modes
//!
//! The vault is *active* when no strategy is set or the strategy is not
//! paused, and *halted* otherwise. The mode is read fresh on every call;
//! the vault never caches it.

use gamevault_protocol::config::MAX_BATCH_LEGS;
use gamevault_protocol::{Address, Amount, Ledger, LedgerError, TokenId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::admin::AdminRegistry;
use crate::events::{EventLog, EventRecord, VaultEvent};
use crate::ownership::{Ownable, OwnershipChange, OwnershipError};
use crate::risk_control::{RiskControlStrategy, StrategyRef};
use crate::withdrawal::Withdrawal;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by vault operations. Any error means nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The caller is neither the owner nor a withdraw admin (or, for
    /// owner-only operations, not the owner).
    #[error("unauthorized: {caller} lacks the required privilege")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The active risk control strategy refused the movement.
    #[error("withdrawals are halted by {strategy}")]
    Paused {
        /// Name of the refusing strategy.
        strategy: String,
    },

    /// The vault holds less of `asset` than requested.
    #[error("insufficient vault balance of {asset}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The asset (zero for native).
        asset: Address,
        /// What the vault holds.
        available: Amount,
        /// What was requested.
        requested: Amount,
    },

    /// The vault does not hold this NFT.
    #[error("vault does not own token {token_id} of {collection}")]
    NotOwner {
        /// The collection.
        collection: Address,
        /// The token.
        token_id: TokenId,
    },

    /// Malformed input: mismatched or empty batches, zero recipients or
    /// amounts, wrong argument shapes.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying ledger refused the transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(#[source] LedgerError),
}

/// Coarse classification of a [`VaultError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`VaultError::Unauthorized`].
    Unauthorized,
    /// See [`VaultError::Paused`].
    Paused,
    /// See [`VaultError::InsufficientBalance`].
    InsufficientBalance,
    /// See [`VaultError::NotOwner`].
    NotOwner,
    /// See [`VaultError::InvalidArgument`].
    InvalidArgument,
    /// See [`VaultError::TransferFailed`].
    TransferFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Paused => write!(f, "paused"),
            ErrorKind::InsufficientBalance => write!(f, "insufficient_balance"),
            ErrorKind::NotOwner => write!(f, "not_owner"),
            ErrorKind::InvalidArgument => write!(f, "invalid_argument"),
            ErrorKind::TransferFailed => write!(f, "transfer_failed"),
        }
    }
}

impl VaultError {
    /// Returns the error's classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Unauthorized { .. } => ErrorKind::Unauthorized,
            VaultError::Paused { .. } => ErrorKind::Paused,
            VaultError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            VaultError::NotOwner { .. } => ErrorKind::NotOwner,
            VaultError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            VaultError::TransferFailed(_) => ErrorKind::TransferFailed,
        }
    }

    /// Maps a ledger failure during a vault-originated transfer.
    fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance {
                asset,
                available,
                requested,
                ..
            } => VaultError::InsufficientBalance {
                asset,
                available,
                requested,
            },
            LedgerError::NotOwner {
                collection,
                token_id,
                ..
            }
            | LedgerError::NonexistentToken {
                collection,
                token_id,
            } => VaultError::NotOwner {
                collection,
                token_id,
            },
            other => VaultError::TransferFailed(other),
        }
    }
}

impl From<OwnershipError> for VaultError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::Unauthorized { caller } | OwnershipError::NotPendingOwner { caller } => {
                VaultError::Unauthorized { caller }
            }
            OwnershipError::ZeroAddress => VaultError::InvalidArgument(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Externally visible operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    /// Withdrawals may proceed.
    Active,
    /// The risk strategy reports paused.
    Halted,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Active => write!(f, "Active"),
            OperatingMode::Halted => write!(f, "Halted"),
        }
    }
}

/// Returned by a committed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Transaction id shared by every event of the call.
    pub tx_id: Uuid,
    /// Number of legs moved.
    pub legs: usize,
}

/// The vault contract.
#[derive(Debug, Clone)]
pub struct GameVault {
    /// The vault's own address: the holder of record in every ledger.
    address: Address,
    ownership: Ownable,
    admins: AdminRegistry,
    risk_control: Option<StrategyRef>,
    events: EventLog,
}

impl GameVault {
    /// Deploys a vault at `address`.
    ///
    /// Initial state: `deployer` is the owner, no admins, no risk strategy
    /// (every movement permitted), empty event log.
    pub fn deploy(address: Address, deployer: Address) -> Self {
        tracing::info!(vault = %address, owner = %deployer, "vault deployed");
        Self {
            address,
            ownership: Ownable::new(deployer),
            admins: AdminRegistry::new(),
            risk_control: None,
            events: EventLog::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Returns the vault's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the current owner.
    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    /// Returns the pending owner of an in-flight two-phase handoff.
    pub fn pending_owner(&self) -> Option<Address> {
        self.ownership.pending_owner()
    }

    /// Returns the admin registry.
    pub fn admins(&self) -> &AdminRegistry {
        &self.admins
    }

    /// Returns `true` if `address` is a registered admin. The owner is not
    /// reported here unless it was enabled explicitly.
    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.is_admin(address)
    }

    /// Returns `true` if `caller` may withdraw: owner OR admin.
    pub fn is_privileged(&self, caller: &Address) -> bool {
        self.ownership.is_owner(caller) || self.admins.is_admin(caller)
    }

    /// Returns the active strategy, if any.
    pub fn risk_control(&self) -> Option<&StrategyRef> {
        self.risk_control.as_ref()
    }

    /// Evaluates the current operating mode.
    pub fn mode(&self) -> OperatingMode {
        match &self.risk_control {
            Some(strategy) if strategy.is_paused() => OperatingMode::Halted,
            _ => OperatingMode::Active,
        }
    }

    /// Returns the event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Returns the records of the most recent committed call.
    pub fn last_events(&self) -> Vec<&EventRecord> {
        match self.events.records().last() {
            Some(last) => self.events.for_tx(last.tx_id).collect(),
            None => Vec::new(),
        }
    }

    /// Returns what the vault holds of `asset`: a native or token amount, or
    /// the number of NFTs for a collection. Ungated; unknown assets read 0.
    pub fn token_balance(&self, ledger: &Ledger, asset: &Address) -> Amount {
        ledger.balance_of(asset, &self.address)
    }

    // -----------------------------------------------------------------------
    // Owner administration
    // -----------------------------------------------------------------------

    /// Enables `admin` as withdraw admin. Owner only, idempotent. An
    /// `AdminEnabled` event is recorded on every successful call.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] for non-owners and
    /// [`VaultError::InvalidArgument`] for the zero address.
    pub fn enable_admin(&mut self, caller: &Address, admin: Address) -> Result<(), VaultError> {
        self.ownership.require_owner(caller)?;
        if admin.is_zero() {
            return Err(VaultError::InvalidArgument(
                "admin must not be the zero address".into(),
            ));
        }
        let added = self.admins.enable(admin);
        tracing::info!(vault = %self.address, %admin, added, "withdraw admin enabled");
        self.commit(vec![VaultEvent::AdminEnabled { admin }]);
        Ok(())
    }

    /// Revokes `admin`. Owner only, idempotent. An `AdminRevoked` event is
    /// recorded only if the address actually was an admin.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] for non-owners.
    pub fn revoke_admin(&mut self, caller: &Address, admin: Address) -> Result<(), VaultError> {
        self.ownership.require_owner(caller)?;
        if self.admins.revoke(&admin) {
            tracing::info!(vault = %self.address, %admin, "withdraw admin revoked");
            self.commit(vec![VaultEvent::AdminRevoked { admin }]);
        }
        Ok(())
    }

    /// Hands over ownership, directly or by proposing a pending owner.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] for non-owners and
    /// [`VaultError::InvalidArgument`] for a direct handoff to zero without
    /// `renounce`.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
        direct: bool,
        renounce: bool,
    ) -> Result<OwnershipChange, VaultError> {
        let change = self
            .ownership
            .transfer_ownership(caller, new_owner, direct, renounce)?;
        let event = match change {
            OwnershipChange::Transferred { previous, new } => {
                tracing::info!(vault = %self.address, %previous, %new, "ownership transferred");
                VaultEvent::OwnershipTransferred { previous, new }
            }
            OwnershipChange::Proposed { candidate } => {
                tracing::info!(vault = %self.address, %candidate, "ownership transfer proposed");
                VaultEvent::OwnershipTransferProposed {
                    owner: *caller,
                    candidate,
                }
            }
        };
        self.commit(vec![event]);
        Ok(change)
    }

    /// Completes a two-phase handoff.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] unless `caller` is the pending owner.
    pub fn claim_ownership(&mut self, caller: &Address) -> Result<(), VaultError> {
        let (previous, new) = self.ownership.claim_ownership(caller)?;
        tracing::info!(vault = %self.address, %previous, %new, "ownership claimed");
        self.commit(vec![VaultEvent::OwnershipTransferred { previous, new }]);
        Ok(())
    }

    /// Replaces the active risk strategy; `None` removes it. Owner only,
    /// effective for every subsequent call.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] for non-owners.
    pub fn set_risk_control_strategy(
        &mut self,
        caller: &Address,
        strategy: Option<StrategyRef>,
    ) -> Result<(), VaultError> {
        self.ownership.require_owner(caller)?;
        let previous = self.risk_control.as_ref().map(|s| s.name().to_string());
        let current = strategy.as_ref().map(|s| s.name().to_string());
        self.risk_control = strategy;

        tracing::info!(
            vault = %self.address,
            previous = ?previous,
            current = ?current,
            "risk control strategy replaced"
        );
        self.commit(vec![VaultEvent::RiskControlStrategyChanged { previous, current }]);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deposits
    // -----------------------------------------------------------------------

    /// Accepts native coin from `from`. Never gated. A zero amount is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::TransferFailed`] if the sender cannot cover it.
    pub fn receive_native(
        &mut self,
        ledger: &mut Ledger,
        from: &Address,
        amount: Amount,
    ) -> Result<(), VaultError> {
        if amount == 0 {
            return Ok(());
        }
        ledger
            .native_mut()
            .transfer(from, &self.address, amount)
            .map_err(VaultError::TransferFailed)?;
        tracing::debug!(vault = %self.address, %from, %amount, "native coin received");
        self.commit(vec![VaultEvent::NativeReceived {
            from: *from,
            amount,
        }]);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Withdrawals
    // -----------------------------------------------------------------------

    /// Sends `amount` of `asset` (zero address for native) to `to`.
    ///
    /// # Errors
    ///
    /// [`VaultError::Unauthorized`], [`VaultError::InvalidArgument`],
    /// [`VaultError::Paused`], [`VaultError::InsufficientBalance`], or
    /// [`VaultError::TransferFailed`].
    pub fn withdraw(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        asset: Address,
        to: Address,
        amount: Amount,
    ) -> Result<ExecutionReceipt, VaultError> {
        self.execute(
            ledger,
            caller,
            vec![Withdrawal::Fungible { asset, to, amount }],
        )
    }

    /// Sends NFT `token_id` of `collection` to `to`.
    ///
    /// # Errors
    ///
    /// [`VaultError::Unauthorized`], [`VaultError::InvalidArgument`],
    /// [`VaultError::Paused`], [`VaultError::NotOwner`], or
    /// [`VaultError::TransferFailed`].
    pub fn withdraw_nft(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        collection: Address,
        to: Address,
        token_id: TokenId,
    ) -> Result<ExecutionReceipt, VaultError> {
        self.execute(
            ledger,
            caller,
            vec![Withdrawal::NonFungible {
                collection,
                to,
                token_id,
            }],
        )
    }

    /// Runs `withdraw(assets[i], tos[i], amounts[i])` for every `i` as one
    /// all-or-nothing unit.
    ///
    /// # Errors
    ///
    /// Everything [`withdraw`](Self::withdraw) returns, plus
    /// [`VaultError::InvalidArgument`] for mismatched, empty, or oversized
    /// sequences. Any failing leg fails the whole batch.
    pub fn batch_withdraw(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        assets: &[Address],
        tos: &[Address],
        amounts: &[Amount],
    ) -> Result<ExecutionReceipt, VaultError> {
        self.require_privileged(caller)?;
        if assets.len() != tos.len() || assets.len() != amounts.len() {
            return Err(VaultError::InvalidArgument(format!(
                "length mismatch: {} assets, {} recipients, {} amounts",
                assets.len(),
                tos.len(),
                amounts.len()
            )));
        }
        let legs = assets
            .iter()
            .zip(tos)
            .zip(amounts)
            .map(|((asset, to), amount)| Withdrawal::Fungible {
                asset: *asset,
                to: *to,
                amount: *amount,
            })
            .collect();
        self.execute(ledger, caller, legs)
    }

    /// Sends `token_ids[i]` of `collection` to `tos[i]` for every `i` as one
    /// all-or-nothing unit.
    ///
    /// # Errors
    ///
    /// Everything [`withdraw_nft`](Self::withdraw_nft) returns, plus
    /// [`VaultError::InvalidArgument`] for mismatched, empty, or oversized
    /// sequences. A single id the vault does not hold fails the whole batch.
    pub fn batch_withdraw_nft(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        collection: Address,
        tos: &[Address],
        token_ids: &[TokenId],
    ) -> Result<ExecutionReceipt, VaultError> {
        self.require_privileged(caller)?;
        if tos.len() != token_ids.len() {
            return Err(VaultError::InvalidArgument(format!(
                "length mismatch: {} recipients, {} token ids",
                tos.len(),
                token_ids.len()
            )));
        }
        let legs = tos
            .iter()
            .zip(token_ids)
            .map(|(to, token_id)| Withdrawal::NonFungible {
                collection,
                to: *to,
                token_id: *token_id,
            })
            .collect();
        self.execute(ledger, caller, legs)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_privileged(&self, caller: &Address) -> Result<(), VaultError> {
        if self.is_privileged(caller) {
            Ok(())
        } else {
            tracing::warn!(vault = %self.address, %caller, "withdrawal rejected: caller not privileged");
            Err(VaultError::Unauthorized { caller: *caller })
        }
    }

    /// The shared pipeline behind every withdrawal entry point.
    fn execute(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        legs: Vec<Withdrawal>,
    ) -> Result<ExecutionReceipt, VaultError> {
        self.require_privileged(caller)?;

        if legs.is_empty() {
            return Err(VaultError::InvalidArgument(
                "a withdrawal needs at least one leg".into(),
            ));
        }
        if legs.len() > MAX_BATCH_LEGS {
            return Err(VaultError::InvalidArgument(format!(
                "{} legs exceeds the batch limit of {MAX_BATCH_LEGS}",
                legs.len()
            )));
        }
        for (index, leg) in legs.iter().enumerate() {
            leg.check_arguments()
                .map_err(|reason| VaultError::InvalidArgument(format!("leg {index}: {reason}")))?;
        }

        let vault = self.address;
        let operator = *caller;
        let strategy = self.risk_control.clone();

        let staged_events = ledger.atomically(|staged| {
            let mut events = Vec::with_capacity(legs.len());
            for (index, leg) in legs.iter().enumerate() {
                check_verdict(strategy.as_deref(), leg)?;
                let moved = match leg {
                    Withdrawal::Fungible { asset, to, amount } => {
                        staged.transfer_fungible(asset, &vault, to, *amount)
                    }
                    Withdrawal::NonFungible {
                        collection,
                        to,
                        token_id,
                    } => staged.transfer_nft(collection, &vault, to, *token_id),
                };
                moved.map_err(VaultError::from_ledger)?;
                tracing::debug!(vault = %vault, leg = index, asset = %leg.asset(), "leg staged");
                events.push(leg.to_event(operator));
            }
            Ok::<_, VaultError>(events)
        });

        let events = match staged_events {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(vault = %vault, %operator, legs = legs.len(), error = %err, "withdrawal reverted");
                return Err(err);
            }
        };

        let tx_id = self.commit(events);
        tracing::info!(vault = %vault, %operator, legs = legs.len(), %tx_id, "withdrawal committed");
        Ok(ExecutionReceipt {
            tx_id,
            legs: legs.len(),
        })
    }

    /// Appends the events of a committed call and returns its id.
    fn commit(&mut self, events: Vec<VaultEvent>) -> Uuid {
        let tx_id = Uuid::new_v4();
        self.events.commit(tx_id, events);
        tx_id
    }
}

/// Asks the strategy about one leg. No strategy means permitted.
fn check_verdict(
    strategy: Option<&dyn RiskControlStrategy>,
    leg: &Withdrawal,
) -> Result<(), VaultError> {
    match strategy {
        Some(strategy) if !strategy.authorize(leg) => Err(VaultError::Paused {
            strategy: strategy.name().to_string(),
        }),
        _ => Ok(()),
    }
}
