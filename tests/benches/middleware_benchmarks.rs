//! # Middleware Benchmarks
//!
//! | Operation | Cost driver |
//! |-----------|-------------|
//! | operator_power_at | active vaults × active subnetworks stake reads |
//! | active_vaults_at | stored shared + exclusive vaults |
//! | slash_vault | membership checks + one slasher call |
//! | update_operator_key | per-operator key set (bounded) |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_tests::fixtures::{addr, key, subnetwork, TestNetwork};
use rand::Rng;
use std::time::Duration;

const WINDOW: u64 = 7 * 24 * 60 * 60;

/// A network with `vaults` shared vaults, `subnets` subnetworks, and one
/// staked operator.
fn populated_network(vaults: u64, subnets: u64) -> TestNetwork {
    let net = TestNetwork::new(WINDOW);
    let operator = addr(1);
    let mut rng = rand::thread_rng();

    for s in 0..subnets {
        net.service.register_subnetwork(subnetwork(s + 1)).unwrap();
    }
    for v in 0..vaults {
        let vault = net.add_shared_vault(100 + v, WINDOW);
        net.service.register_shared_vault(vault).unwrap();
        for s in 0..subnets {
            net.stake(vault, subnetwork(s + 1), operator, 0, rng.gen_range(1..1_000_000));
        }
    }
    net
}

// ============================================================================
// Power
// ============================================================================

fn bench_operator_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("operator-power");
    group.measurement_time(Duration::from_secs(5));

    for (vaults, subnets) in [(4, 2), (16, 4), (64, 8)] {
        let net = populated_network(vaults, subnets);
        let operator = addr(1);

        group.throughput(Throughput::Elements(vaults * subnets));
        group.bench_with_input(
            BenchmarkId::new("operator_power_at", format!("{}x{}", vaults, subnets)),
            &(vaults, subnets),
            |b, _| b.iter(|| black_box(net.service.operator_power_at(&operator, 10).unwrap())),
        );
    }

    group.finish();
}

fn bench_active_vaults(c: &mut Criterion) {
    let mut group = c.benchmark_group("membership-queries");

    for vaults in [16u64, 256, 1024] {
        let net = populated_network(vaults, 1);
        group.throughput(Throughput::Elements(vaults));
        group.bench_with_input(BenchmarkId::new("active_vaults_at", vaults), &vaults, |b, _| {
            b.iter(|| black_box(net.service.active_vaults_at(10)))
        });
    }

    group.finish();
}

// ============================================================================
// Slashing and keys
// ============================================================================

fn bench_slash(c: &mut Criterion) {
    let net = populated_network(16, 4);
    let slasher = addr(900);
    let vault = addr(100);
    net.collateral.add_instant_slasher(slasher);
    net.attach_slasher(vault, WINDOW, slasher);
    net.at(100);

    c.bench_function("slash_vault_instant", |b| {
        b.iter(|| {
            black_box(
                net.service
                    .slash_vault(50, vault, subnetwork(1), addr(1), 1u64.into(), &[])
                    .unwrap(),
            )
        })
    });
}

fn bench_key_rotation(c: &mut Criterion) {
    let net = TestNetwork::new(WINDOW);
    let operator = addr(1);
    let mut now = 0u64;
    let mut next = 1u64;

    // Each rotation lands after the previous key cooled down
    c.bench_function("update_operator_key", |b| {
        b.iter(|| {
            now += WINDOW;
            next += 1;
            net.at(now);
            net.service.update_operator_key(operator, key(next)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_operator_power,
    bench_active_vaults,
    bench_slash,
    bench_key_rotation
);
criterion_main!(benches);
