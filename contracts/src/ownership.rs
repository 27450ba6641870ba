//! # Ownership
//!
//! Single-owner control with two handoff styles:
//!
//! - **Direct**: `transfer_ownership(new, direct = true, renounce)` swaps the
//!   owner immediately. Handing over to the zero address is refused unless
//!   `renounce` is set, so a typo cannot brick the contract by accident.
//! - **Two-phase**: `transfer_ownership(new, direct = false, _)` records a
//!   pending owner who must then call [`Ownable::claim_ownership`].
//!
//! Ownership is independent of the admin set. Changing owners never adds or
//! removes admins.

use gamevault_protocol::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by ownership operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    /// The caller is not the current owner.
    #[error("unauthorized: {caller} is not the owner")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The caller is not the pending owner.
    #[error("unauthorized: {caller} is not the pending owner")]
    NotPendingOwner {
        /// The address that attempted to claim.
        caller: Address,
    },

    /// A direct handoff to the zero address without `renounce`.
    #[error("refusing to hand ownership to the zero address without renounce")]
    ZeroAddress,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a call to [`Ownable::transfer_ownership`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipChange {
    /// The owner changed immediately.
    Transferred {
        /// The previous owner.
        previous: Address,
        /// The new owner (zero if renounced).
        new: Address,
    },
    /// A pending owner was recorded (zero clears any pending owner).
    Proposed {
        /// The candidate who may now claim.
        candidate: Address,
    },
}

/// Owner identity plus an optional pending handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
    pending_owner: Option<Address>,
}

impl Ownable {
    /// Creates an `Ownable` owned by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            pending_owner: None,
        }
    }

    /// Returns the current owner. Zero once renounced.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Returns the pending owner, if a two-phase handoff is in flight.
    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    /// Returns `true` if `caller` is the owner. Nobody owns a renounced contract.
    pub fn is_owner(&self, caller: &Address) -> bool {
        !self.owner.is_zero() && self.owner == *caller
    }

    /// Fails unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Address) -> Result<(), OwnershipError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(OwnershipError::Unauthorized { caller: *caller })
        }
    }

    /// Starts or completes a handoff. See the module docs for the two styles.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::Unauthorized`] if `caller` is not the owner
    /// and [`OwnershipError::ZeroAddress`] for a direct handoff to zero
    /// without `renounce`.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
        direct: bool,
        renounce: bool,
    ) -> Result<OwnershipChange, OwnershipError> {
        self.require_owner(caller)?;

        if !direct {
            self.pending_owner = (!new_owner.is_zero()).then_some(new_owner);
            return Ok(OwnershipChange::Proposed {
                candidate: new_owner,
            });
        }

        if new_owner.is_zero() && !renounce {
            return Err(OwnershipError::ZeroAddress);
        }

        let previous = self.owner;
        self.owner = new_owner;
        self.pending_owner = None;
        Ok(OwnershipChange::Transferred {
            previous,
            new: new_owner,
        })
    }

    /// Completes a two-phase handoff. Returns `(previous, new)`.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::NotPendingOwner`] unless `caller` is the
    /// recorded pending owner.
    pub fn claim_ownership(&mut self, caller: &Address) -> Result<(Address, Address), OwnershipError> {
        match self.pending_owner {
            Some(pending) if pending == *caller => {
                let previous = self.owner;
                self.owner = pending;
                self.pending_owner = None;
                Ok((previous, pending))
            }
            _ => Err(OwnershipError::NotPendingOwner { caller: *caller }),
        }
    }
}
