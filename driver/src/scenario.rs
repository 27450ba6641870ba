//! # Scenario Scripts
//!
//! A scenario is a JSON list of steps replayed against a fresh
//! [`Deployment`]. Steps set up the world (tokens, collections, balances),
//! flip the risk switch, and invoke vault methods through the ABI boundary
//! with an expected outcome. The first unmet expectation aborts the run.
//!
//! ```json
//! { "steps": [
//!   { "action": "deployToken", "name": "GT", "decimals": 18 },
//!   { "action": "mint", "token": "GT", "to": "vault", "amount": "100" },
//!   { "action": "call", "caller": "admin-1", "method": "withdraw",
//!     "args": ["GT", "player", "10"] },
//!   { "action": "setPaused", "paused": true },
//!   { "action": "call", "caller": "admin-1", "method": "batchWithdraw",
//!     "args": [["GT"], ["player"], ["1"]], "expect": "paused" },
//!   { "action": "assertBalance", "asset": "GT", "holder": "player", "amount": "10" }
//! ]}
//! ```

use anyhow::{anyhow, bail, Context, Result};
use gamevault_contracts::abi::{CallContext, CallOutput};
use gamevault_contracts::{ErrorKind, EventRecord};
use gamevault_protocol::config::DEFAULT_TOKEN_DECIMALS;
use gamevault_protocol::ledger::amount_string;
use gamevault_protocol::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::deploy::Deployment;
use crate::metrics::{DriverMetrics, OUTCOME_OK};

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    /// Deploy a fungible token at the address `name` resolves to.
    #[serde(rename_all = "camelCase")]
    DeployToken {
        name: String,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        decimals: Option<u8>,
    },
    /// Deploy an NFT collection at the address `name` resolves to.
    #[serde(rename_all = "camelCase")]
    DeployCollection {
        name: String,
        #[serde(default)]
        symbol: Option<String>,
    },
    /// Mint fungible tokens.
    Mint {
        token: String,
        to: String,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// Mint NFTs.
    #[serde(rename_all = "camelCase")]
    MintNft {
        collection: String,
        to: String,
        token_ids: Vec<TokenId>,
    },
    /// Credit native coin out of thin air.
    Fund {
        account: String,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// Send native coin from `from` into the vault.
    SendNative {
        from: String,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// Flip the default strategy's pause flag. The caller defaults to the
    /// strategy's controller.
    SetPaused {
        #[serde(default)]
        caller: Option<String>,
        paused: bool,
    },
    /// Make `account` refuse (or accept again) native receipts.
    RejectNative {
        account: String,
        #[serde(default = "default_true")]
        rejects: bool,
    },
    /// Invoke a vault method. `expect` is `ok` or an error kind.
    Call {
        caller: String,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        expect: Expectation,
    },
    /// Check a holder's balance of an asset (NFT collections count tokens).
    AssertBalance {
        asset: String,
        holder: String,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
}

fn default_true() -> bool {
    true
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::DeployToken { .. } => "deployToken",
            Step::DeployCollection { .. } => "deployCollection",
            Step::Mint { .. } => "mint",
            Step::MintNft { .. } => "mintNft",
            Step::Fund { .. } => "fund",
            Step::SendNative { .. } => "sendNative",
            Step::SetPaused { .. } => "setPaused",
            Step::RejectNative { .. } => "rejectNative",
            Step::Call { .. } => "call",
            Step::AssertBalance { .. } => "assertBalance",
        }
    }
}

/// Expected outcome of a `call` step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// The call succeeds.
    #[default]
    Ok,
    Unauthorized,
    Paused,
    InsufficientBalance,
    NotOwner,
    InvalidArgument,
    TransferFailed,
}

impl Expectation {
    fn matches(self, outcome: &std::result::Result<CallOutput, ErrorKind>) -> bool {
        match (self, outcome) {
            (Expectation::Ok, Ok(_)) => true,
            (Expectation::Unauthorized, Err(ErrorKind::Unauthorized))
            | (Expectation::Paused, Err(ErrorKind::Paused))
            | (Expectation::InsufficientBalance, Err(ErrorKind::InsufficientBalance))
            | (Expectation::NotOwner, Err(ErrorKind::NotOwner))
            | (Expectation::InvalidArgument, Err(ErrorKind::InvalidArgument))
            | (Expectation::TransferFailed, Err(ErrorKind::TransferFailed)) => true,
            _ => false,
        }
    }
}

/// One executed `call` step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTrace {
    pub step: usize,
    pub caller: Address,
    pub method: String,
    pub expect: Expectation,
    /// The output on success.
    pub output: Option<CallOutput>,
    /// The error kind and message on failure.
    pub error: Option<TraceError>,
    /// Events the call committed, empty on failure.
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceError {
    pub kind: ErrorKind,
    pub message: String,
}

/// What `run` prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub network: String,
    pub steps_executed: usize,
    pub calls: Vec<CallTrace>,
    pub events: Vec<EventRecord>,
}

/// Replays scripts against a deployment.
pub struct Runner<'a> {
    deployment: &'a mut Deployment,
    metrics: &'a DriverMetrics,
    calls: Vec<CallTrace>,
}

impl<'a> Runner<'a> {
    pub fn new(deployment: &'a mut Deployment, metrics: &'a DriverMetrics) -> Self {
        Self {
            deployment,
            metrics,
            calls: Vec::new(),
        }
    }

    /// Runs every step in order, stopping at the first failure.
    pub fn run(mut self, script: &Script) -> Result<RunReport> {
        for (index, step) in script.steps.iter().enumerate() {
            self.execute(index, step)
                .with_context(|| format!("step {index} ({}) failed", step.name()))?;
            self.metrics.steps_total.inc();
        }
        Ok(RunReport {
            network: self.deployment.network.clone(),
            steps_executed: script.steps.len(),
            calls: self.calls,
            events: self.deployment.vault.events().records().to_vec(),
        })
    }

    fn resolve(&self, text: &str) -> Result<Address> {
        self.deployment.accounts.lookup(text)
    }

    fn execute(&mut self, index: usize, step: &Step) -> Result<()> {
        tracing::debug!(step = index, action = step.name(), "executing step");
        match step {
            Step::DeployToken {
                name,
                symbol,
                decimals,
            } => {
                let address = self.resolve(name)?;
                self.deployment.ledger.deploy_token(
                    address,
                    symbol.as_deref().unwrap_or(name),
                    decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
                )?;
                self.deployment.accounts.register(name, address);
            }
            Step::DeployCollection { name, symbol } => {
                let address = self.resolve(name)?;
                self.deployment
                    .ledger
                    .deploy_collection(address, symbol.as_deref().unwrap_or(name))?;
                self.deployment.accounts.register(name, address);
            }
            Step::Mint { token, to, amount } => {
                let (token_addr, to) = (self.resolve(token)?, self.resolve(to)?);
                self.deployment
                    .ledger
                    .token_mut(&token_addr)
                    .ok_or_else(|| anyhow!("no token deployed as `{token}`"))?
                    .mint(&to, *amount)?;
            }
            Step::MintNft {
                collection,
                to,
                token_ids,
            } => {
                let (collection_addr, to) = (self.resolve(collection)?, self.resolve(to)?);
                let nft = self
                    .deployment
                    .ledger
                    .collection_mut(&collection_addr)
                    .ok_or_else(|| anyhow!("no collection deployed as `{collection}`"))?;
                for id in token_ids {
                    nft.mint(*id, &to)?;
                }
            }
            Step::Fund { account, amount } => {
                let account = self.resolve(account)?;
                self.deployment.ledger.native_mut().credit(&account, *amount)?;
            }
            Step::SendNative { from, amount } => {
                let from = self.resolve(from)?;
                let before = self.next_sequence();
                let deployment = &mut *self.deployment;
                deployment
                    .vault
                    .receive_native(&mut deployment.ledger, &from, *amount)?;
                self.committed_since(before);
            }
            Step::SetPaused { caller, paused } => {
                let deployed = self
                    .deployment
                    .risk_control
                    .as_ref()
                    .ok_or_else(|| anyhow!("no risk control strategy deployed"))?;
                let caller = match caller {
                    Some(text) => self.deployment.accounts.lookup(text)?,
                    None => deployed.handle.controller(),
                };
                deployed.handle.set_paused(&caller, *paused)?;
            }
            Step::RejectNative { account, rejects } => {
                let account = self.resolve(account)?;
                self.deployment
                    .ledger
                    .native_mut()
                    .set_rejects_payments(&account, *rejects);
            }
            Step::Call {
                caller,
                method,
                args,
                expect,
            } => self.call(index, caller, method, args, *expect)?,
            Step::AssertBalance {
                asset,
                holder,
                amount,
            } => {
                let (asset_addr, holder_addr) = (self.resolve(asset)?, self.resolve(holder)?);
                let actual = self.deployment.ledger.balance_of(&asset_addr, &holder_addr);
                if actual != *amount {
                    bail!("balance of {holder} in {asset} is {actual}, expected {amount}");
                }
            }
        }
        Ok(())
    }

    fn call(
        &mut self,
        index: usize,
        caller: &str,
        method: &str,
        args: &[Value],
        expect: Expectation,
    ) -> Result<()> {
        let caller = self.resolve(caller)?;
        let before = self.next_sequence();

        let deployment = &mut *self.deployment;
        let mut ctx = CallContext {
            ledger: &mut deployment.ledger,
            strategies: &deployment.strategies,
        };
        let result = deployment
            .vault
            .call(&mut ctx, &caller, method, args, &deployment.accounts);

        let outcome = result.as_ref().cloned().map_err(|e| e.kind());
        let outcome_label = match &outcome {
            Ok(_) => OUTCOME_OK.to_string(),
            Err(kind) => kind.to_string(),
        };
        self.metrics.record_call(method, &outcome_label);
        let events = self.committed_since(before);

        let (output, error) = match result {
            Ok(output) => (Some(output), None),
            Err(err) => (
                None,
                Some(TraceError {
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            ),
        };
        self.calls.push(CallTrace {
            step: index,
            caller,
            method: method.to_string(),
            expect,
            output,
            error: error.clone(),
            events,
        });

        if !expect.matches(&outcome) {
            let actual = match error {
                Some(err) => format!("{} ({})", err.kind, err.message),
                None => OUTCOME_OK.to_string(),
            };
            bail!("{method} expected {expect:?}, got {actual}");
        }
        tracing::info!(step = index, method, outcome = %outcome_label, "call matched expectation");
        Ok(())
    }

    /// Sequence number the next committed event will carry.
    fn next_sequence(&self) -> u64 {
        self.deployment.vault.events().len() as u64
    }

    /// Returns the events committed from sequence `from` on and counts them.
    fn committed_since(&self, from: u64) -> Vec<EventRecord> {
        let events = self.deployment.vault.events().since(from).to_vec();
        self.metrics
            .events_committed_total
            .inc_by(events.len() as u64);
        events
    }
}
