//! # Risk Control
//!
//! A risk control strategy is the vault's circuit breaker. The vault asks it
//! one question before every asset movement, "may this leave?", and acts on
//! the boolean answer alone. It never reads or writes strategy internals.
//!
//! Strategies are trait objects behind an `Arc` so the owner can swap them at
//! runtime and the strategy's own controller can flip them from outside the
//! vault. Having no strategy at all means every movement is permitted.
//!
//! ## Default Strategy
//!
//! [`DefaultRiskControlStrategy`] is a single pause flag guarded by its own
//! controller. The controller is typically an incident-response account that
//! does not own the vault: it can halt withdrawals without being able to
//! perform them.

use gamevault_protocol::Address;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::withdrawal::Withdrawal;

/// Shared handle to a strategy, as held by the vault.
pub type StrategyRef = Arc<dyn RiskControlStrategy>;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// The verdict capability the vault consults.
pub trait RiskControlStrategy: fmt::Debug + Send + Sync {
    /// Short name used in logs, events, and errors.
    fn name(&self) -> &str;

    /// Returns `true` while asset releases are halted.
    fn is_paused(&self) -> bool;

    /// Verdict for one leg. Defaults to "permitted unless paused".
    fn authorize(&self, _withdrawal: &Withdrawal) -> bool {
        !self.is_paused()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by strategy administration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskControlError {
    /// The caller is not the strategy's controller.
    #[error("unauthorized: {caller} is not the risk controller")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The controller cannot be handed to the zero address.
    #[error("the risk controller cannot be the zero address")]
    ZeroController,
}

// ---------------------------------------------------------------------------
// Default strategy
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PauseState {
    controller: Address,
    paused: bool,
}

/// A pause flag settable only by its controller.
#[derive(Debug)]
pub struct DefaultRiskControlStrategy {
    state: RwLock<PauseState>,
}

impl DefaultRiskControlStrategy {
    /// Creates an unpaused strategy controlled by `controller`.
    pub fn new(controller: Address) -> Self {
        Self {
            state: RwLock::new(PauseState {
                controller,
                paused: false,
            }),
        }
    }

    /// Convenience constructor returning the shared handle directly.
    pub fn shared(controller: Address) -> Arc<Self> {
        Arc::new(Self::new(controller))
    }

    /// Returns the current controller.
    pub fn controller(&self) -> Address {
        self.state.read().controller
    }

    /// Sets the pause flag. Returns `true` if the flag changed.
    ///
    /// # Errors
    ///
    /// Returns [`RiskControlError::Unauthorized`] unless `caller` is the
    /// controller.
    pub fn set_paused(&self, caller: &Address, paused: bool) -> Result<bool, RiskControlError> {
        let mut state = self.state.write();
        if state.controller != *caller {
            return Err(RiskControlError::Unauthorized { caller: *caller });
        }
        let changed = state.paused != paused;
        state.paused = paused;

        if changed && paused {
            tracing::warn!(controller = %caller, "risk control engaged: withdrawals halted");
        } else if changed {
            tracing::info!(controller = %caller, "risk control released: withdrawals resumed");
        }
        Ok(changed)
    }

    /// Hands the controller role to `new_controller`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskControlError::Unauthorized`] unless `caller` is the
    /// controller, and [`RiskControlError::ZeroController`] for the zero
    /// address.
    pub fn transfer_control(
        &self,
        caller: &Address,
        new_controller: Address,
    ) -> Result<(), RiskControlError> {
        let mut state = self.state.write();
        if state.controller != *caller {
            return Err(RiskControlError::Unauthorized { caller: *caller });
        }
        if new_controller.is_zero() {
            return Err(RiskControlError::ZeroController);
        }
        state.controller = new_controller;
        Ok(())
    }
}

impl RiskControlStrategy for DefaultRiskControlStrategy {
    fn name(&self) -> &str {
        "DefaultRiskControlStrategy"
    }

    fn is_paused(&self) -> bool {
        self.state.read().paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn leg() -> Withdrawal {
        Withdrawal::Fungible {
            asset: Address::ZERO,
            to: addr("x"),
            amount: 1,
        }
    }

    #[test]
    fn starts_unpaused() {
        let strategy = DefaultRiskControlStrategy::new(addr("controller"));
        assert!(!strategy.is_paused());
        assert!(strategy.authorize(&leg()));
        assert_eq!(strategy.controller(), addr("controller"));
    }

    #[test]
    fn controller_toggles_pause() {
        let strategy = DefaultRiskControlStrategy::new(addr("controller"));
        assert!(strategy.set_paused(&addr("controller"), true).unwrap());
        assert!(strategy.is_paused());
        assert!(!strategy.authorize(&leg()));

        // Same value again is not a change.
        assert!(!strategy.set_paused(&addr("controller"), true).unwrap());

        assert!(strategy.set_paused(&addr("controller"), false).unwrap());
        assert!(strategy.authorize(&leg()));
    }

    #[test]
    fn non_controller_cannot_toggle() {
        let strategy = DefaultRiskControlStrategy::new(addr("controller"));
        assert_eq!(
            strategy.set_paused(&addr("vault-owner"), true),
            Err(RiskControlError::Unauthorized {
                caller: addr("vault-owner")
            })
        );
        assert!(!strategy.is_paused());
    }

    #[test]
    fn control_handoff() {
        let strategy = DefaultRiskControlStrategy::new(addr("controller"));
        assert_eq!(
            strategy.transfer_control(&addr("controller"), Address::ZERO),
            Err(RiskControlError::ZeroController)
        );
        strategy
            .transfer_control(&addr("controller"), addr("incident"))
            .unwrap();
        assert!(strategy.set_paused(&addr("controller"), true).is_err());
        assert!(strategy.set_paused(&addr("incident"), true).unwrap());
    }

    #[test]
    fn shared_handle_sees_updates() {
        let strategy = DefaultRiskControlStrategy::shared(addr("controller"));
        let as_dyn: StrategyRef = strategy.clone();
        strategy.set_paused(&addr("controller"), true).unwrap();
        assert!(as_dyn.is_paused());
        assert_eq!(as_dyn.name(), "DefaultRiskControlStrategy");
    }
}
