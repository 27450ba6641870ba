//! # Admin Registry
//!
//! The set of withdraw admins. Membership is a flag per address: enabling an
//! admin twice is the same as enabling it once, and revoking an address that
//! was never an admin is not an error.
//!
//! The registry does not know about the owner. The vault checks "owner OR
//! admin" at each entry point, so the owner stays privileged without being a
//! member, and handing over ownership leaves this set alone.

use gamevault_protocol::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of addresses allowed to withdraw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminRegistry {
    admins: BTreeSet<Address>,
}

impl AdminRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `admin`. Returns `true` if it was not already present.
    pub fn enable(&mut self, admin: Address) -> bool {
        self.admins.insert(admin)
    }

    /// Removes `admin`. Returns `true` if it was present.
    pub fn revoke(&mut self, admin: &Address) -> bool {
        self.admins.remove(admin)
    }

    /// Returns `true` if `address` is a registered admin.
    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    /// Iterates the admins in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.admins.iter()
    }

    /// Returns the number of admins.
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Returns `true` if there are no admins.
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}
