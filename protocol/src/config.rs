//! # Protocol Configuration & Constants
//!
//! Every fixed number the vault and its ledgers agree on lives here. Changing
//! one of these after contracts hold real assets means migrating custody, so
//! treat them as frozen once a network goes live.

use crate::address::Address;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// The protocol version string reported by the driver.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// The reserved asset reference for the native base currency.
///
/// Withdrawal entry points accept this in place of a token address so callers
/// use one code path for every fungible asset class.
pub const NATIVE_ASSET: Address = Address::ZERO;

/// Display precision of the native coin. The ledger never divides.
pub const NATIVE_DECIMALS: u8 = 18;

/// Default precision for newly deployed fungible tokens.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Script label that always resolves to [`NATIVE_ASSET`].
pub const NATIVE_LABEL: &str = "native";

/// Script label that resolves to the deployed vault's address.
pub const VAULT_LABEL: &str = "vault";

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum number of legs in one batch withdrawal.
///
/// Each leg re-consults the risk strategy and performs one transfer; beyond
/// a few hundred the staged copy of the ledger dominates the call cost.
pub const MAX_BATCH_LEGS: usize = 256;

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Network name used when a deploy configuration does not specify one.
pub const DEFAULT_NETWORK: &str = "development";

/// Networks the driver knows by name. Anything else is accepted but logged.
pub const KNOWN_NETWORKS: &[&str] = &["development", "testnet", "mainnet"];

/// Returns `true` for a network name in [`KNOWN_NETWORKS`].
pub fn is_known_network(name: &str) -> bool {
    KNOWN_NETWORKS.contains(&name)
}
