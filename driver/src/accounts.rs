//! Account naming for configs and scripts.
//!
//! Resolution order for an address string:
//!
//! 1. `native` is the native-asset sentinel.
//! 2. A name registered during deployment (`vault`, `risk`, deployed tokens).
//! 3. Anything starting with `0x` must be a valid 20-byte hex address.
//! 4. Any other non-empty string is a label, mapped deterministically
//!    through [`Address::from_label`].

use anyhow::{anyhow, Result};
use gamevault_contracts::AddressResolver;
use gamevault_protocol::config::NATIVE_LABEL;
use gamevault_protocol::Address;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    names: BTreeMap<String, Address>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `address`, replacing any earlier binding.
    pub fn register(&mut self, name: &str, address: Address) {
        self.names.insert(name.to_string(), address);
    }

    /// Resolves `text`, with an error that names the offending input.
    pub fn lookup(&self, text: &str) -> Result<Address> {
        self.resolve(text)
            .map_err(|e| anyhow!("cannot resolve address `{text}`: {e}"))
    }
}

impl AddressResolver for AccountBook {
    fn resolve(&self, text: &str) -> Result<Address, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty address".into());
        }
        if text == NATIVE_LABEL {
            return Ok(Address::ZERO);
        }
        if let Some(address) = self.names.get(text) {
            return Ok(*address);
        }
        if text.starts_with("0x") || text.starts_with("0X") {
            return Address::from_hex(text).map_err(|e| e.to_string());
        }
        Ok(Address::from_label(text))
    }
}
