// Batch withdrawal benchmarks for the game vault.
//
// Covers fungible and NFT batches at increasing leg counts, with the default
// risk strategy attached so every leg pays for its verdict.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use gamevault_contracts::{DefaultRiskControlStrategy, GameVault};
use gamevault_protocol::{Address, Ledger};

/// Builds a vault holding plenty of GT and `nfts` NFTs, with "admin" enabled.
fn setup(nfts: u64) -> (GameVault, Ledger) {
    let owner = Address::from_label("owner");
    let mut vault = GameVault::deploy(Address::from_label("vault"), owner);
    let mut ledger = Ledger::new();
    let gt = Address::from_label("GT");
    let gnft = Address::from_label("GNFT");

    ledger.deploy_token(gt, "GT", 18).unwrap();
    ledger.deploy_collection(gnft, "GNFT").unwrap();
    ledger
        .token_mut(&gt)
        .unwrap()
        .mint(&vault.address(), u128::MAX / 2)
        .unwrap();
    let collection = ledger.collection_mut(&gnft).unwrap();
    for id in 0..nfts {
        collection.mint(id, &vault.address()).unwrap();
    }

    vault
        .enable_admin(&owner, Address::from_label("admin"))
        .unwrap();
    vault
        .set_risk_control_strategy(
            &owner,
            Some(DefaultRiskControlStrategy::shared(Address::from_label("controller"))),
        )
        .unwrap();
    (vault, ledger)
}

fn recipients(n: usize) -> Vec<Address> {
    (0..n)
        .map(|i| Address::from_label(&format!("player-{i}")))
        .collect()
}

fn bench_batch_withdraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/batch_withdraw");
    let admin = Address::from_label("admin");
    let gt = Address::from_label("GT");

    for legs in [1usize, 16, 64, 256] {
        let assets = vec![gt; legs];
        let tos = recipients(legs);
        let amounts = vec![1_000u128; legs];

        group.throughput(Throughput::Elements(legs as u64));
        group.bench_with_input(BenchmarkId::from_parameter(legs), &legs, |b, _| {
            b.iter_batched(
                || setup(0),
                |(mut vault, mut ledger)| {
                    vault
                        .batch_withdraw(&mut ledger, &admin, &assets, &tos, &amounts)
                        .unwrap()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_batch_withdraw_nft(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/batch_withdraw_nft");
    let admin = Address::from_label("admin");
    let gnft = Address::from_label("GNFT");

    for legs in [1usize, 16, 64, 256] {
        let tos = recipients(legs);
        let ids: Vec<u64> = (0..legs as u64).collect();

        group.throughput(Throughput::Elements(legs as u64));
        group.bench_with_input(BenchmarkId::from_parameter(legs), &legs, |b, _| {
            b.iter_batched(
                || setup(legs as u64),
                |(mut vault, mut ledger)| {
                    vault
                        .batch_withdraw_nft(&mut ledger, &admin, gnft, &tos, &ids)
                        .unwrap()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch_withdraw, bench_batch_withdraw_nft);
criterion_main!(benches);
