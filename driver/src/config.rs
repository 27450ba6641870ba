//! # Deploy Configuration
//!
//! The JSON file the driver deploys from. Addresses are written either as
//! `0x`-prefixed hex or as plain labels resolved by the [`AccountBook`].
//!
//! ```json
//! {
//!   "network": "development",
//!   "gameVault": {
//!     "deployer": "deployer",
//!     "withdrawAdmins": ["admin-1", "admin-2"],
//!     "owner": "0x5b38da6a701c568545dcfcb03fcb875f56beddc4"
//!   },
//!   "riskControl": { "controller": "incident", "attach": true, "paused": false }
//! }
//! ```
//!
//! [`AccountBook`]: crate::accounts::AccountBook

use anyhow::{bail, Context, Result};
use gamevault_protocol::config::{is_known_network, DEFAULT_NETWORK};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level deploy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// Network name, only used for reporting.
    #[serde(default = "default_network")]
    pub network: String,
    /// Vault setup.
    pub game_vault: GameVaultConfig,
    /// Risk control strategy to deploy alongside the vault, if any.
    #[serde(default)]
    pub risk_control: Option<RiskControlConfig>,
}

/// Vault setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameVaultConfig {
    /// The deploying account; owns the vault until the handoff.
    pub deployer: String,
    /// Accounts enabled as withdraw admins. Must not be empty.
    #[serde(default)]
    pub withdraw_admins: Vec<String>,
    /// Final owner. Ownership is handed over directly after admin setup.
    #[serde(default)]
    pub owner: Option<String>,
}

/// Default risk control strategy setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskControlConfig {
    /// The account allowed to flip the pause flag.
    pub controller: String,
    /// Attach the strategy to the vault at deploy time.
    #[serde(default = "default_true")]
    pub attach: bool,
    /// Deploy the strategy already paused.
    #[serde(default)]
    pub paused: bool,
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_true() -> bool {
    true
}

impl DeployConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: DeployConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.game_vault.deployer.trim().is_empty() {
            bail!("gameVault.deployer must be set");
        }
        if self.game_vault.withdraw_admins.is_empty() {
            bail!("withdraw admins should be configured for GameVault (gameVault.withdrawAdmins is empty)");
        }
        if let Some(risk) = &self.risk_control {
            if risk.controller.trim().is_empty() {
                bail!("riskControl.controller must be set");
            }
        }
        if !is_known_network(&self.network) {
            tracing::warn!(network = %self.network, "deploying to an unrecognized network");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"{
                "network": "testnet",
                "gameVault": {
                    "deployer": "deployer",
                    "withdrawAdmins": ["a", "b"],
                    "owner": "ops"
                },
                "riskControl": { "controller": "incident", "paused": true }
            }"#,
        );
        let config = DeployConfig::load(file.path()).unwrap();
        assert_eq!(config.network, "testnet");
        assert_eq!(config.game_vault.withdraw_admins, vec!["a", "b"]);
        assert_eq!(config.game_vault.owner.as_deref(), Some("ops"));
        let risk = config.risk_control.unwrap();
        assert!(risk.attach);
        assert!(risk.paused);
    }

    #[test]
    fn defaults_apply() {
        let file = write_config(r#"{ "gameVault": { "deployer": "d", "withdrawAdmins": ["a"] } }"#);
        let config = DeployConfig::load(file.path()).unwrap();
        assert_eq!(config.network, DEFAULT_NETWORK);
        assert!(config.game_vault.owner.is_none());
        assert!(config.risk_control.is_none());
    }

    #[test]
    fn empty_admins_rejected() {
        let file = write_config(r#"{ "gameVault": { "deployer": "d", "withdrawAdmins": [] } }"#);
        let err = DeployConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("withdraw admins"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = DeployConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn malformed_json_rejected() {
        let file = write_config("{ not json");
        assert!(DeployConfig::load(file.path()).is_err());
    }
}
