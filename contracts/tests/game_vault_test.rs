//! Integration tests for the game vault.
//!
//! These tests drive the vault through the same public surface a deployment
//! uses: a shared ledger, a separately controlled risk strategy, and
//! operators that come and go over the vault's life.

use gamevault_contracts::{
    DefaultRiskControlStrategy, ErrorKind, GameVault, OperatingMode, VaultError, VaultEvent,
};
use gamevault_protocol::{Address, Ledger};
use std::sync::Arc;

const GT: u128 = 1_000_000_000_000_000_000;

fn addr(label: &str) -> Address {
    Address::from_label(label)
}

struct World {
    vault: GameVault,
    ledger: Ledger,
    strategy: Arc<DefaultRiskControlStrategy>,
}

/// Vault owned by "deployer" with "admin" enabled, the default strategy
/// attached (unpaused, controlled by "controller"), and 100 GT in custody.
fn world() -> World {
    let mut vault = GameVault::deploy(addr("vault"), addr("deployer"));
    let mut ledger = Ledger::new();
    ledger.deploy_token(addr("GT"), "GT", 18).unwrap();
    ledger.deploy_collection(addr("GNFT"), "GNFT").unwrap();
    ledger
        .token_mut(&addr("GT"))
        .unwrap()
        .mint(&vault.address(), 100 * GT)
        .unwrap();

    vault.enable_admin(&addr("deployer"), addr("admin")).unwrap();
    let strategy = DefaultRiskControlStrategy::shared(addr("controller"));
    vault
        .set_risk_control_strategy(&addr("deployer"), Some(strategy.clone()))
        .unwrap();

    World {
        vault,
        ledger,
        strategy,
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[test]
fn withdraw_pause_unpause_scenario() {
    let World {
        mut vault,
        mut ledger,
        strategy,
    } = world();
    let admin = addr("admin");
    let x = addr("x");

    // 1. Withdraw 10 GT
    vault
        .withdraw(&mut ledger, &admin, addr("GT"), x, 10 * GT)
        .unwrap();
    assert_eq!(vault.token_balance(&ledger, &addr("GT")), 90 * GT);
    assert_eq!(ledger.balance_of(&addr("GT"), &x), 10 * GT);

    // 2. Pause: every batch fails, balances frozen
    strategy.set_paused(&addr("controller"), true).unwrap();
    assert_eq!(vault.mode(), OperatingMode::Halted);
    let err = vault
        .batch_withdraw(&mut ledger, &admin, &[addr("GT")], &[x], &[GT])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Paused);
    assert_eq!(vault.token_balance(&ledger, &addr("GT")), 90 * GT);
    assert_eq!(ledger.balance_of(&addr("GT"), &x), 10 * GT);

    // 3. Unpause: a valid batch goes through
    strategy.set_paused(&addr("controller"), false).unwrap();
    vault
        .batch_withdraw(
            &mut ledger,
            &admin,
            &[addr("GT"), addr("GT")],
            &[x, addr("y")],
            &[5 * GT, 5 * GT],
        )
        .unwrap();
    assert_eq!(vault.token_balance(&ledger, &addr("GT")), 80 * GT);
    assert_eq!(ledger.balance_of(&addr("GT"), &x), 15 * GT);
    assert_eq!(ledger.balance_of(&addr("GT"), &addr("y")), 5 * GT);
}

#[test]
fn paused_vault_still_accepts_deposits() {
    let World {
        mut vault,
        mut ledger,
        strategy,
    } = world();
    strategy.set_paused(&addr("controller"), true).unwrap();
    ledger.native_mut().credit(&addr("player"), GT).unwrap();

    vault
        .receive_native(&mut ledger, &addr("player"), GT)
        .unwrap();
    assert_eq!(vault.token_balance(&ledger, &Address::ZERO), GT);
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn outsiders_fail_every_privileged_operation() {
    let World {
        mut vault,
        mut ledger,
        ..
    } = world();
    let mallory = addr("mallory");

    let results = [
        vault
            .withdraw(&mut ledger, &mallory, addr("GT"), mallory, GT)
            .map(|_| ()),
        vault
            .withdraw_nft(&mut ledger, &mallory, addr("GNFT"), mallory, 1)
            .map(|_| ()),
        vault
            .batch_withdraw(&mut ledger, &mallory, &[addr("GT")], &[mallory], &[GT])
            .map(|_| ()),
        vault
            .batch_withdraw_nft(&mut ledger, &mallory, addr("GNFT"), &[mallory], &[1])
            .map(|_| ()),
        vault.enable_admin(&mallory, mallory),
        vault.revoke_admin(&mallory, addr("admin")),
        vault.set_risk_control_strategy(&mallory, None),
        vault
            .transfer_ownership(&mallory, mallory, true, false)
            .map(|_| ()),
    ];
    for result in results {
        assert_eq!(result, Err(VaultError::Unauthorized { caller: mallory }));
    }
    assert_eq!(vault.token_balance(&ledger, &addr("GT")), 100 * GT);
    assert!(vault.is_admin(&addr("admin")));
    assert!(vault.risk_control().is_some());
    assert_eq!(vault.owner(), addr("deployer"));
}

#[test]
fn admins_cannot_manage_admins_or_strategy() {
    let World { mut vault, .. } = world();
    let admin = addr("admin");
    assert_eq!(
        vault.enable_admin(&admin, addr("friend")).unwrap_err().kind(),
        ErrorKind::Unauthorized
    );
    assert_eq!(
        vault
            .set_risk_control_strategy(&admin, None)
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
}

#[test]
fn controller_pauses_but_cannot_withdraw() {
    let World {
        mut vault,
        mut ledger,
        strategy,
    } = world();
    let controller = addr("controller");
    strategy.set_paused(&controller, true).unwrap();
    let err = vault
        .withdraw(&mut ledger, &controller, addr("GT"), controller, GT)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn owner_cannot_pause_through_the_strategy() {
    let World { strategy, .. } = world();
    assert!(strategy.set_paused(&addr("deployer"), true).is_err());
}

#[test]
fn enabling_admin_twice_is_harmless() {
    let World { mut vault, .. } = world();
    vault.enable_admin(&addr("deployer"), addr("admin")).unwrap();
    assert_eq!(vault.admins().len(), 1);
    assert!(vault.is_admin(&addr("admin")));
}

// ---------------------------------------------------------------------------
// Asset kinds
// ---------------------------------------------------------------------------

#[test]
fn native_and_fungible_withdrawals_have_equal_deltas() {
    let World {
        mut vault,
        mut ledger,
        ..
    } = world();
    ledger.native_mut().credit(&addr("treasury"), 100 * GT).unwrap();
    vault
        .receive_native(&mut ledger, &addr("treasury"), 100 * GT)
        .unwrap();

    let admin = addr("admin");
    vault
        .withdraw(&mut ledger, &admin, Address::ZERO, addr("x"), 7 * GT)
        .unwrap();
    vault
        .withdraw(&mut ledger, &admin, addr("GT"), addr("x"), 7 * GT)
        .unwrap();

    assert_eq!(
        vault.token_balance(&ledger, &Address::ZERO),
        vault.token_balance(&ledger, &addr("GT"))
    );
    assert_eq!(
        ledger.native().balance_of(&addr("x")),
        ledger.balance_of(&addr("GT"), &addr("x"))
    );
}

#[test]
fn nft_batch_to_one_recipient() {
    let World {
        mut vault,
        mut ledger,
        ..
    } = world();
    let nft = ledger.collection_mut(&addr("GNFT")).unwrap();
    for id in 1..=5 {
        nft.mint(id, &vault.address()).unwrap();
    }
    let a = addr("a");

    vault
        .batch_withdraw_nft(&mut ledger, &addr("admin"), addr("GNFT"), &[a, a], &[3, 4])
        .unwrap();

    let nft = ledger.collection(&addr("GNFT")).unwrap();
    assert_eq!(nft.balance_of(&a), 2);
    assert_eq!(nft.owner_of(3), Some(a));
    assert_eq!(nft.owner_of(4), Some(a));
    assert_eq!(vault.token_balance(&ledger, &addr("GNFT")), 3);
}

#[test]
fn nft_withdrawals_resume_after_unpause() {
    let World {
        mut vault,
        mut ledger,
        strategy,
    } = world();
    let nft = ledger.collection_mut(&addr("GNFT")).unwrap();
    for id in 1..=5 {
        nft.mint(id, &vault.address()).unwrap();
    }
    let admin = addr("admin");
    let a = addr("a");

    strategy.set_paused(&addr("controller"), true).unwrap();
    let err = vault
        .withdraw_nft(&mut ledger, &admin, addr("GNFT"), a, 1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Paused);
    let err = vault
        .batch_withdraw_nft(&mut ledger, &admin, addr("GNFT"), &[a, a], &[3, 4])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Paused);
    assert_eq!(vault.token_balance(&ledger, &addr("GNFT")), 5);

    strategy.set_paused(&addr("controller"), false).unwrap();
    let receipt = vault
        .batch_withdraw_nft(&mut ledger, &admin, addr("GNFT"), &[a, a], &[3, 4])
        .unwrap();
    assert_eq!(receipt.legs, 2);
    vault
        .withdraw_nft(&mut ledger, &admin, addr("GNFT"), a, 1)
        .unwrap();

    let nft = ledger.collection(&addr("GNFT")).unwrap();
    assert_eq!(nft.balance_of(&a), 3);
    assert_eq!(nft.owner_of(3), Some(a));
    assert_eq!(nft.owner_of(4), Some(a));
    assert_eq!(vault.token_balance(&ledger, &addr("GNFT")), 2);
}

#[test]
fn rejecting_recipient_fails_native_batch_atomically() {
    let World {
        mut vault,
        mut ledger,
        ..
    } = world();
    ledger.native_mut().credit(&addr("treasury"), 10).unwrap();
    vault
        .receive_native(&mut ledger, &addr("treasury"), 10)
        .unwrap();
    ledger
        .native_mut()
        .set_rejects_payments(&addr("contract"), true);
    let before = vault.events().len();

    let err = vault
        .batch_withdraw(
            &mut ledger,
            &addr("admin"),
            &[addr("GT"), Address::ZERO],
            &[addr("x"), addr("contract")],
            &[GT, 5],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert_eq!(vault.token_balance(&ledger, &addr("GT")), 100 * GT);
    assert_eq!(vault.token_balance(&ledger, &Address::ZERO), 10);
    assert_eq!(vault.events().len(), before);
}

// ---------------------------------------------------------------------------
// Strategy swaps and ownership
// ---------------------------------------------------------------------------

#[test]
fn swapped_strategy_takes_effect_immediately() {
    let World {
        mut vault,
        mut ledger,
        strategy,
    } = world();
    strategy.set_paused(&addr("controller"), true).unwrap();

    let fresh = DefaultRiskControlStrategy::shared(addr("controller-2"));
    vault
        .set_risk_control_strategy(&addr("deployer"), Some(fresh))
        .unwrap();
    assert_eq!(vault.mode(), OperatingMode::Active);
    vault
        .withdraw(&mut ledger, &addr("admin"), addr("GT"), addr("x"), GT)
        .unwrap();

    let changed = vault
        .events()
        .records()
        .iter()
        .filter(|r| matches!(r.event, VaultEvent::RiskControlStrategyChanged { .. }))
        .count();
    assert_eq!(changed, 2);
}

#[test]
fn ownership_handoff_leaves_admins_alone() {
    let World {
        mut vault,
        mut ledger,
        ..
    } = world();
    vault
        .transfer_ownership(&addr("deployer"), addr("multisig"), true, false)
        .unwrap();

    assert_eq!(vault.owner(), addr("multisig"));
    assert!(vault.is_admin(&addr("admin")));
    vault
        .withdraw(&mut ledger, &addr("multisig"), addr("GT"), addr("x"), GT)
        .unwrap();
    vault
        .revoke_admin(&addr("multisig"), addr("admin"))
        .unwrap();
    assert!(!vault.is_admin(&addr("admin")));
}

#[test]
fn renounced_vault_keeps_serving_admins() {
    let World {
        mut vault,
        mut ledger,
        ..
    } = world();
    vault
        .transfer_ownership(&addr("deployer"), Address::ZERO, true, true)
        .unwrap();
    assert!(vault.owner().is_zero());
    assert!(!vault.is_privileged(&Address::ZERO));
    vault
        .withdraw(&mut ledger, &addr("admin"), addr("GT"), addr("x"), GT)
        .unwrap();
}
