//! # Call Decoding
//!
//! The JSON boundary of the vault. External callers (scripts, the driver,
//! tests) name a method and pass positional JSON arguments; [`decode`] turns
//! that into a typed [`VaultCall`] and [`GameVault::dispatch`] runs it.
//!
//! Decoding happens before any state is touched, so a malformed call, a
//! scalar passed where a sequence is required included, fails with
//! [`VaultError::InvalidArgument`] and changes nothing.
//!
//! ## Argument Encoding
//!
//! | Kind       | Accepted JSON                                             |
//! |------------|-----------------------------------------------------------|
//! | address    | string, resolved through an [`AddressResolver`]           |
//! | amount     | decimal string or non-negative integer                    |
//! | token id   | non-negative integer or decimal string                    |
//! | bool       | `true` / `false`                                          |
//! | sequence   | array of the above; anything else is rejected             |

use gamevault_protocol::ledger::amount_string;
use gamevault_protocol::{Address, Amount, Ledger, TokenId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::game_vault::{ExecutionReceipt, GameVault, VaultError};
use crate::risk_control::StrategyRef;

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// A decoded vault call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    /// `getTokenBalance(asset)`
    GetTokenBalance { asset: Address },
    /// `isAdmin(address)`
    IsAdmin { address: Address },
    /// `owner()`
    Owner,
    /// `withdraw(asset, to, amount)`
    Withdraw {
        asset: Address,
        to: Address,
        amount: Amount,
    },
    /// `withdrawNFT(collection, to, tokenId)`
    WithdrawNft {
        collection: Address,
        to: Address,
        token_id: TokenId,
    },
    /// `batchWithdraw(assets[], tos[], amounts[])`
    BatchWithdraw {
        assets: Vec<Address>,
        tos: Vec<Address>,
        amounts: Vec<Amount>,
    },
    /// `batchWithdrawNFT(collection, tos[], tokenIds[])`
    BatchWithdrawNft {
        collection: Address,
        tos: Vec<Address>,
        token_ids: Vec<TokenId>,
    },
    /// `enableAdmin(admin)`
    EnableAdmin { admin: Address },
    /// `revokeAdmin(admin)`
    RevokeAdmin { admin: Address },
    /// `transferOwnership(newOwner, direct[, renounce])`
    TransferOwnership {
        new_owner: Address,
        direct: bool,
        renounce: bool,
    },
    /// `claimOwnership()`
    ClaimOwnership,
    /// `setRiskControlStrategy(strategy)`; the zero address removes it.
    SetRiskControlStrategy { strategy: Address },
}

impl VaultCall {
    /// The ABI method name.
    pub fn method(&self) -> &'static str {
        match self {
            VaultCall::GetTokenBalance { .. } => "getTokenBalance",
            VaultCall::IsAdmin { .. } => "isAdmin",
            VaultCall::Owner => "owner",
            VaultCall::Withdraw { .. } => "withdraw",
            VaultCall::WithdrawNft { .. } => "withdrawNFT",
            VaultCall::BatchWithdraw { .. } => "batchWithdraw",
            VaultCall::BatchWithdrawNft { .. } => "batchWithdrawNFT",
            VaultCall::EnableAdmin { .. } => "enableAdmin",
            VaultCall::RevokeAdmin { .. } => "revokeAdmin",
            VaultCall::TransferOwnership { .. } => "transferOwnership",
            VaultCall::ClaimOwnership => "claimOwnership",
            VaultCall::SetRiskControlStrategy { .. } => "setRiskControlStrategy",
        }
    }

    /// Returns `true` for calls that never mutate state.
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            VaultCall::GetTokenBalance { .. } | VaultCall::IsAdmin { .. } | VaultCall::Owner
        )
    }
}

/// Every method [`decode`] understands.
pub const METHODS: [&str; 12] = [
    "getTokenBalance",
    "isAdmin",
    "owner",
    "withdraw",
    "withdrawNFT",
    "batchWithdraw",
    "batchWithdrawNFT",
    "enableAdmin",
    "revokeAdmin",
    "transferOwnership",
    "claimOwnership",
    "setRiskControlStrategy",
];

/// The result of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CallOutput {
    /// A balance or NFT count.
    Balance(#[serde(with = "amount_string")] Amount),
    /// A predicate answer.
    Bool(bool),
    /// An address.
    Address(Address),
    /// A committed withdrawal.
    Receipt(ExecutionReceipt),
    /// A state change with nothing to report.
    Unit,
}

// ---------------------------------------------------------------------------
// Address resolution
// ---------------------------------------------------------------------------

/// Turns the textual form of an address argument into an [`Address`].
pub trait AddressResolver {
    /// Resolves `text`, or describes why it cannot.
    fn resolve(&self, text: &str) -> Result<Address, String>;
}

/// Accepts only `0x`-prefixed or bare 40-digit hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexResolver;

impl AddressResolver for HexResolver {
    fn resolve(&self, text: &str) -> Result<Address, String> {
        Address::from_hex(text).map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn invalid(msg: impl Into<String>) -> VaultError {
    VaultError::InvalidArgument(msg.into())
}

/// Decodes `method(args...)` into a [`VaultCall`].
///
/// # Errors
///
/// Returns [`VaultError::InvalidArgument`] for an unknown method, wrong
/// arity, or any argument of the wrong shape.
pub fn decode(
    method: &str,
    args: &[Value],
    resolver: &dyn AddressResolver,
) -> Result<VaultCall, VaultError> {
    let address = |i: usize, name: &str| address_arg(&args[i], name, resolver);

    let call = match method {
        "getTokenBalance" => {
            expect_arity(method, args, 1)?;
            VaultCall::GetTokenBalance {
                asset: address(0, "asset")?,
            }
        }
        "isAdmin" => {
            expect_arity(method, args, 1)?;
            VaultCall::IsAdmin {
                address: address(0, "address")?,
            }
        }
        "owner" => {
            expect_arity(method, args, 0)?;
            VaultCall::Owner
        }
        "withdraw" => {
            expect_arity(method, args, 3)?;
            VaultCall::Withdraw {
                asset: address(0, "asset")?,
                to: address(1, "to")?,
                amount: amount_from_value(&args[2]).map_err(|e| invalid(format!("amount: {e}")))?,
            }
        }
        "withdrawNFT" => {
            expect_arity(method, args, 3)?;
            VaultCall::WithdrawNft {
                collection: address(0, "collection")?,
                to: address(1, "to")?,
                token_id: token_id_from_value(&args[2])
                    .map_err(|e| invalid(format!("tokenId: {e}")))?,
            }
        }
        "batchWithdraw" => {
            expect_arity(method, args, 3)?;
            let assets = sequence_arg(&args[0], "assets")?
                .iter()
                .map(|v| address_arg(v, "assets[]", resolver))
                .collect::<Result<Vec<_>, _>>()?;
            let tos = sequence_arg(&args[1], "tos")?
                .iter()
                .map(|v| address_arg(v, "tos[]", resolver))
                .collect::<Result<Vec<_>, _>>()?;
            let amounts = sequence_arg(&args[2], "amounts")?
                .iter()
                .map(|v| amount_from_value(v).map_err(|e| invalid(format!("amounts[]: {e}"))))
                .collect::<Result<Vec<_>, _>>()?;
            VaultCall::BatchWithdraw {
                assets,
                tos,
                amounts,
            }
        }
        "batchWithdrawNFT" => {
            expect_arity(method, args, 3)?;
            let collection = address(0, "collection")?;
            let tos = sequence_arg(&args[1], "tos")?
                .iter()
                .map(|v| address_arg(v, "tos[]", resolver))
                .collect::<Result<Vec<_>, _>>()?;
            let token_ids = sequence_arg(&args[2], "tokenIds")?
                .iter()
                .map(|v| token_id_from_value(v).map_err(|e| invalid(format!("tokenIds[]: {e}"))))
                .collect::<Result<Vec<_>, _>>()?;
            VaultCall::BatchWithdrawNft {
                collection,
                tos,
                token_ids,
            }
        }
        "enableAdmin" => {
            expect_arity(method, args, 1)?;
            VaultCall::EnableAdmin {
                admin: address(0, "admin")?,
            }
        }
        "revokeAdmin" => {
            expect_arity(method, args, 1)?;
            VaultCall::RevokeAdmin {
                admin: address(0, "admin")?,
            }
        }
        "transferOwnership" => {
            if !(2..=3).contains(&args.len()) {
                return Err(invalid(format!(
                    "transferOwnership takes 2 or 3 arguments, got {}",
                    args.len()
                )));
            }
            VaultCall::TransferOwnership {
                new_owner: address(0, "newOwner")?,
                direct: bool_arg(&args[1], "direct")?,
                renounce: match args.get(2) {
                    Some(v) => bool_arg(v, "renounce")?,
                    None => false,
                },
            }
        }
        "claimOwnership" => {
            expect_arity(method, args, 0)?;
            VaultCall::ClaimOwnership
        }
        "setRiskControlStrategy" => {
            expect_arity(method, args, 1)?;
            VaultCall::SetRiskControlStrategy {
                strategy: address(0, "strategy")?,
            }
        }
        other => return Err(invalid(format!("unknown method `{other}`"))),
    };
    Ok(call)
}

fn expect_arity(method: &str, args: &[Value], expected: usize) -> Result<(), VaultError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(invalid(format!(
            "{method} takes {expected} argument(s), got {}",
            args.len()
        )))
    }
}

fn address_arg(
    value: &Value,
    name: &str,
    resolver: &dyn AddressResolver,
) -> Result<Address, VaultError> {
    match value {
        Value::String(text) => resolver
            .resolve(text)
            .map_err(|e| invalid(format!("{name}: {e}"))),
        other => Err(invalid(format!("{name}: expected an address, got {other}"))),
    }
}

fn sequence_arg<'v>(value: &'v Value, name: &str) -> Result<&'v [Value], VaultError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(invalid(format!("{name}: expected a sequence, got {other}"))),
    }
}

fn bool_arg(value: &Value, name: &str) -> Result<bool, VaultError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(format!("{name}: expected a bool, got {value}")))
}

/// Reads an amount from a decimal string or a non-negative integer, with
/// the same rules as the ledger's `amount_string` serde form.
///
/// # Errors
///
/// Describes the problem when `value` is neither.
pub fn amount_from_value(value: &Value) -> Result<Amount, String> {
    amount_string::deserialize(value).map_err(|e| e.to_string())
}

/// Reads a token id from a non-negative integer or a decimal string.
///
/// # Errors
///
/// Describes the problem when `value` is neither.
pub fn token_id_from_value(value: &Value) -> Result<TokenId, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("{n} is not a non-negative integer")),
        Value::String(s) => s
            .trim()
            .parse::<TokenId>()
            .map_err(|e| format!("`{s}` is not a token id: {e}")),
        other => Err(format!("expected a token id, got {other}")),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// What a dispatched call may touch besides the vault itself.
pub struct CallContext<'a> {
    /// The shared asset ledger.
    pub ledger: &'a mut Ledger,
    /// Deployed strategies, by address, for `setRiskControlStrategy`.
    pub strategies: &'a HashMap<Address, StrategyRef>,
}

impl GameVault {
    /// Runs a decoded call on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns, plus
    /// [`VaultError::InvalidArgument`] for a strategy address that is not
    /// deployed.
    pub fn dispatch(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: &Address,
        call: VaultCall,
    ) -> Result<CallOutput, VaultError> {
        let output = match call {
            VaultCall::GetTokenBalance { asset } => {
                CallOutput::Balance(self.token_balance(ctx.ledger, &asset))
            }
            VaultCall::IsAdmin { address } => CallOutput::Bool(self.is_admin(&address)),
            VaultCall::Owner => CallOutput::Address(self.owner()),
            VaultCall::Withdraw { asset, to, amount } => {
                CallOutput::Receipt(self.withdraw(ctx.ledger, caller, asset, to, amount)?)
            }
            VaultCall::WithdrawNft {
                collection,
                to,
                token_id,
            } => CallOutput::Receipt(self.withdraw_nft(ctx.ledger, caller, collection, to, token_id)?),
            VaultCall::BatchWithdraw {
                assets,
                tos,
                amounts,
            } => CallOutput::Receipt(self.batch_withdraw(ctx.ledger, caller, &assets, &tos, &amounts)?),
            VaultCall::BatchWithdrawNft {
                collection,
                tos,
                token_ids,
            } => CallOutput::Receipt(self.batch_withdraw_nft(
                ctx.ledger, caller, collection, &tos, &token_ids,
            )?),
            VaultCall::EnableAdmin { admin } => {
                self.enable_admin(caller, admin)?;
                CallOutput::Unit
            }
            VaultCall::RevokeAdmin { admin } => {
                self.revoke_admin(caller, admin)?;
                CallOutput::Unit
            }
            VaultCall::TransferOwnership {
                new_owner,
                direct,
                renounce,
            } => {
                self.transfer_ownership(caller, new_owner, direct, renounce)?;
                CallOutput::Unit
            }
            VaultCall::ClaimOwnership => {
                self.claim_ownership(caller)?;
                CallOutput::Unit
            }
            VaultCall::SetRiskControlStrategy { strategy } => {
                let resolved = if strategy.is_zero() {
                    None
                } else {
                    let found = ctx.strategies.get(&strategy).cloned().ok_or_else(|| {
                        invalid(format!("no risk control strategy deployed at {strategy}"))
                    })?;
                    Some(found)
                };
                self.set_risk_control_strategy(caller, resolved)?;
                CallOutput::Unit
            }
        };
        Ok(output)
    }

    /// Decodes and dispatches in one step.
    ///
    /// # Errors
    ///
    /// See [`decode`] and [`dispatch`](Self::dispatch).
    pub fn call(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: &Address,
        method: &str,
        args: &[Value],
        resolver: &dyn AddressResolver,
    ) -> Result<CallOutput, VaultError> {
        let call = decode(method, args, resolver).map_err(|err| {
            tracing::warn!(%caller, method, error = %err, "call rejected at decoding");
            err
        })?;
        self.dispatch(ctx, caller, call)
    }
}
