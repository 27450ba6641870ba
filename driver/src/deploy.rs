//! # Deployment
//!
//! Stands up a vault from a [`DeployConfig`], in the same order an operator
//! would on a live network:
//!
//! 1. Validate. Zero withdraw admins aborts before anything is deployed.
//! 2. Deploy the vault; the deployer is the initial owner.
//! 3. Deploy the default risk strategy (if configured), pause it if asked,
//!    and attach it while the deployer still owns the vault.
//! 4. Enable every configured withdraw admin.
//! 5. Hand ownership directly to the configured owner.

use anyhow::{Context, Result};
use gamevault_contracts::{DefaultRiskControlStrategy, GameVault, RiskControlStrategy, StrategyRef};
use gamevault_protocol::config::{NATIVE_DECIMALS, PROTOCOL_VERSION, VAULT_LABEL};
use gamevault_protocol::{Address, Ledger};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::accounts::AccountBook;
use crate::config::DeployConfig;

/// Registered name of the deployed default strategy.
pub const RISK_LABEL: &str = "risk";

/// A deployed vault together with the world it lives in.
#[derive(Debug)]
pub struct Deployment {
    pub network: String,
    pub vault: GameVault,
    pub ledger: Ledger,
    pub accounts: AccountBook,
    /// Strategies a `setRiskControlStrategy` call may name, by address.
    pub strategies: HashMap<Address, StrategyRef>,
    /// The default strategy, if one was deployed.
    pub risk_control: Option<DeployedStrategy>,
}

/// The deployed default strategy: its address and concrete handle, which
/// the scenario runner needs for pause toggling.
#[derive(Debug)]
pub struct DeployedStrategy {
    pub address: Address,
    pub handle: Arc<DefaultRiskControlStrategy>,
}

/// What `deploy` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub protocol_version: String,
    pub network: String,
    /// Display precision for native amounts in scripts and reports.
    pub native_decimals: u8,
    pub vault: Address,
    pub owner: Address,
    pub withdraw_admins: Vec<Address>,
    pub risk_control: Option<RiskControlSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskControlSummary {
    pub strategy: Address,
    pub controller: Address,
    pub attached: bool,
    pub paused: bool,
}

impl Deployment {
    /// Runs the deployment described by `config`.
    pub fn deploy(config: &DeployConfig) -> Result<Self> {
        config.validate()?;

        let mut accounts = AccountBook::new();
        let deployer = accounts
            .lookup(&config.game_vault.deployer)
            .context("invalid gameVault.deployer")?;

        let vault_address = Address::from_label(VAULT_LABEL);
        accounts.register(VAULT_LABEL, vault_address);
        let mut vault = GameVault::deploy(vault_address, deployer);
        tracing::info!(network = %config.network, vault = %vault_address, "GameVault deployed");

        let mut strategies: HashMap<Address, StrategyRef> = HashMap::new();
        let mut risk_control = None;
        if let Some(risk) = &config.risk_control {
            let controller = accounts
                .lookup(&risk.controller)
                .context("invalid riskControl.controller")?;
            let strategy = DefaultRiskControlStrategy::shared(controller);
            let strategy_address = Address::from_label(RISK_LABEL);
            accounts.register(RISK_LABEL, strategy_address);
            tracing::info!(strategy = %strategy_address, %controller, "DefaultRiskControlStrategy deployed");

            if risk.paused {
                strategy
                    .set_paused(&controller, true)
                    .context("failed to pause risk control strategy")?;
            }
            if risk.attach {
                vault
                    .set_risk_control_strategy(&deployer, Some(strategy.clone()))
                    .context("failed to attach risk control strategy")?;
            }
            strategies.insert(strategy_address, strategy.clone());
            risk_control = Some(DeployedStrategy {
                address: strategy_address,
                handle: strategy,
            });
        }

        for name in &config.game_vault.withdraw_admins {
            let admin = accounts
                .lookup(name)
                .with_context(|| format!("invalid withdraw admin `{name}`"))?;
            vault
                .enable_admin(&deployer, admin)
                .with_context(|| format!("failed to enable withdraw admin {admin}"))?;
            tracing::info!(%admin, "withdraw admin added");
        }

        if let Some(owner) = &config.game_vault.owner {
            let owner = accounts
                .lookup(owner)
                .context("failed to transfer ownership, invalid owner address configured")?;
            vault
                .transfer_ownership(&deployer, owner, true, false)
                .context("failed to transfer ownership")?;
            tracing::info!(%owner, "ownership transferred");
        }

        Ok(Self {
            network: config.network.clone(),
            vault,
            ledger: Ledger::new(),
            accounts,
            strategies,
            risk_control,
        })
    }

    pub fn summary(&self) -> DeploymentSummary {
        let risk_control = self.risk_control.as_ref().map(|deployed| {
            let attached = self.vault.risk_control().is_some_and(|active| {
                Arc::as_ptr(active) as *const () == Arc::as_ptr(&deployed.handle) as *const ()
            });
            RiskControlSummary {
                strategy: deployed.address,
                controller: deployed.handle.controller(),
                attached,
                paused: deployed.handle.is_paused(),
            }
        });

        DeploymentSummary {
            protocol_version: PROTOCOL_VERSION.to_string(),
            network: self.network.clone(),
            native_decimals: NATIVE_DECIMALS,
            vault: self.vault.address(),
            owner: self.vault.owner(),
            withdraw_admins: self.vault.admins().iter().copied().collect(),
            risk_control,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameVaultConfig, RiskControlConfig};

    fn config(admins: &[&str], owner: Option<&str>) -> DeployConfig {
        DeployConfig {
            network: "development".into(),
            game_vault: GameVaultConfig {
                deployer: "deployer".into(),
                withdraw_admins: admins.iter().map(|s| s.to_string()).collect(),
                owner: owner.map(str::to_string),
            },
            risk_control: Some(RiskControlConfig {
                controller: "incident".into(),
                attach: true,
                paused: false,
            }),
        }
    }

    #[test]
    fn deploys_admins_then_hands_over() {
        let deployment = Deployment::deploy(&config(&["a", "b"], Some("ops"))).unwrap();
        let vault = &deployment.vault;
        assert_eq!(vault.owner(), Address::from_label("ops"));
        assert!(vault.is_admin(&Address::from_label("a")));
        assert!(vault.is_admin(&Address::from_label("b")));
        assert!(vault.risk_control().is_some());

        let summary = deployment.summary();
        assert_eq!(summary.withdraw_admins.len(), 2);
        let risk = summary.risk_control.unwrap();
        assert!(risk.attached);
        assert!(!risk.paused);
        assert_eq!(risk.controller, Address::from_label("incident"));
    }

    #[test]
    fn no_owner_keeps_deployer() {
        let deployment = Deployment::deploy(&config(&["a"], None)).unwrap();
        assert_eq!(deployment.vault.owner(), Address::from_label("deployer"));
    }

    #[test]
    fn empty_admins_abort() {
        assert!(Deployment::deploy(&config(&[], Some("ops"))).is_err());
    }

    #[test]
    fn invalid_owner_is_fatal() {
        let err = Deployment::deploy(&config(&["a"], Some("0xnothex"))).unwrap_err();
        assert!(format!("{err:#}").contains("invalid owner address"));
    }

    #[test]
    fn paused_and_detached_strategy() {
        let mut cfg = config(&["a"], None);
        cfg.risk_control = Some(RiskControlConfig {
            controller: "incident".into(),
            attach: false,
            paused: true,
        });
        let deployment = Deployment::deploy(&cfg).unwrap();
        assert!(deployment.vault.risk_control().is_none());
        let risk = deployment.summary().risk_control.unwrap();
        assert!(!risk.attached);
        assert!(risk.paused);
        assert!(deployment
            .strategies
            .contains_key(&Address::from_label(RISK_LABEL)));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let deployment = Deployment::deploy(&config(&["a"], None)).unwrap();
        let json = serde_json::to_value(deployment.summary()).unwrap();
        assert!(json.get("withdrawAdmins").is_some());
        assert!(json.get("protocolVersion").is_some());
        assert_eq!(json["nativeDecimals"], 18);
        assert_eq!(json["vault"], Address::from_label(VAULT_LABEL).to_hex());
    }

    #[test]
    fn contract_names_do_not_alias_deployed_addresses() {
        let deployment = Deployment::deploy(&config(&["a"], None)).unwrap();
        let accounts = &deployment.accounts;
        let vault = deployment.vault.address();
        let strategy = deployment.risk_control.as_ref().unwrap().address;

        assert_eq!(accounts.lookup(VAULT_LABEL).unwrap(), vault);
        assert_eq!(accounts.lookup(RISK_LABEL).unwrap(), strategy);
        assert_ne!(accounts.lookup("GameVault").unwrap(), vault);
        assert_ne!(accounts.lookup("DefaultRiskControlStrategy").unwrap(), strategy);
    }
}
