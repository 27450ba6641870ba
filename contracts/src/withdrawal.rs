//! # Withdrawal Legs
//!
//! A [`Withdrawal`] is one asset movement out of the vault: some amount of a
//! fungible asset (native coin included) or one NFT. Single operations run one
//! leg, batches run many. The risk strategy judges legs, the vault executes
//! them, and each committed leg becomes exactly one event.

use gamevault_protocol::ledger::amount_string;
use gamevault_protocol::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};

use crate::events::VaultEvent;

/// One asset movement out of the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Withdrawal {
    /// A fungible amount. `asset` is the zero address for the native coin.
    Fungible {
        /// Token address or the native sentinel.
        asset: Address,
        /// Recipient.
        to: Address,
        /// Amount in smallest units.
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// A single NFT.
    NonFungible {
        /// Collection address.
        collection: Address,
        /// Recipient.
        to: Address,
        /// The token being released.
        token_id: TokenId,
    },
}

impl Withdrawal {
    /// Returns the recipient.
    pub fn recipient(&self) -> Address {
        match self {
            Withdrawal::Fungible { to, .. } | Withdrawal::NonFungible { to, .. } => *to,
        }
    }

    /// Returns the asset or collection being moved.
    pub fn asset(&self) -> Address {
        match self {
            Withdrawal::Fungible { asset, .. } => *asset,
            Withdrawal::NonFungible { collection, .. } => *collection,
        }
    }

    /// Checks the leg's own arguments, independent of any ledger state.
    ///
    /// Returns a description of the first problem found.
    pub fn check_arguments(&self) -> Result<(), String> {
        if self.recipient().is_zero() {
            return Err("recipient must not be the zero address".into());
        }
        match self {
            Withdrawal::Fungible { amount: 0, .. } => Err("amount must be greater than zero".into()),
            Withdrawal::NonFungible { collection, .. } if collection.is_zero() => {
                Err("the native sentinel is not an NFT collection".into())
            }
            _ => Ok(()),
        }
    }

    /// The event recorded when this leg commits.
    pub fn to_event(&self, operator: Address) -> VaultEvent {
        match *self {
            Withdrawal::Fungible { asset, to, amount } => VaultEvent::Withdrawn {
                operator,
                asset,
                to,
                amount,
            },
            Withdrawal::NonFungible {
                collection,
                to,
                token_id,
            } => VaultEvent::NftWithdrawn {
                operator,
                collection,
                to,
                token_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn argument_checks() {
        let ok = Withdrawal::Fungible {
            asset: Address::ZERO,
            to: addr("x"),
            amount: 1,
        };
        assert!(ok.check_arguments().is_ok());

        let zero_amount = Withdrawal::Fungible {
            asset: addr("GT"),
            to: addr("x"),
            amount: 0,
        };
        assert!(zero_amount.check_arguments().is_err());

        let zero_recipient = Withdrawal::NonFungible {
            collection: addr("GNFT"),
            to: Address::ZERO,
            token_id: 1,
        };
        assert!(zero_recipient.check_arguments().is_err());

        let native_nft = Withdrawal::NonFungible {
            collection: Address::ZERO,
            to: addr("x"),
            token_id: 1,
        };
        assert!(native_nft.check_arguments().is_err());
    }

    #[test]
    fn events_carry_the_operator() {
        let leg = Withdrawal::NonFungible {
            collection: addr("GNFT"),
            to: addr("x"),
            token_id: 3,
        };
        assert_eq!(
            leg.to_event(addr("admin")),
            VaultEvent::NftWithdrawn {
                operator: addr("admin"),
                collection: addr("GNFT"),
                to: addr("x"),
                token_id: 3,
            }
        );
        assert_eq!(leg.asset(), addr("GNFT"));
        assert_eq!(leg.recipient(), addr("x"));
    }
}
