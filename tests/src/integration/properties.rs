//! # Property Tests
//!
//! Randomised memberships checked against brute-force models:
//! - operator power is the sum over active (vault, subnetwork) pairs
//! - a vault is never shared and exclusive at once
//! - key rotation keeps the per-operator bounds and global uniqueness

#[cfg(test)]
mod tests {
    use crate::fixtures::{addr, key, subnetwork, TestNetwork};
    use proptest::prelude::*;
    use qc_middleware::domain::{
        invariant_key_bounds, invariant_key_uniqueness, invariant_vault_exclusivity,
        invariant_vault_reverse_map,
    };
    use qc_middleware::{Address, OperatorKey, U256};
    use std::collections::HashSet;

    const WINDOW: u64 = 50;

    #[derive(Clone, Debug)]
    struct VaultPlan {
        /// `None` for shared, `Some(i)` for exclusive to operator `i`.
        owner: Option<u64>,
        paused_at: Option<u64>,
        stakes: Vec<u64>,
    }

    fn arb_vault() -> impl Strategy<Value = VaultPlan> {
        (
            prop::option::of(0u64..3),
            prop::option::of(1u64..100),
            prop::collection::vec(0u64..1_000, 3),
        )
            .prop_map(|(owner, paused_at, stakes)| VaultPlan {
                owner,
                paused_at,
                stakes,
            })
    }

    #[derive(Clone, Debug)]
    enum KeyOp {
        Update { operator: u64, key: u64, advance: u64 },
        Clear { operator: u64, advance: u64 },
    }

    fn arb_key_op() -> impl Strategy<Value = KeyOp> {
        prop_oneof![
            4 => (0u64..3, 1u64..6, 0u64..40)
                .prop_map(|(operator, key, advance)| KeyOp::Update { operator, key, advance }),
            1 => (0u64..3, 0u64..40)
                .prop_map(|(operator, advance)| KeyOp::Clear { operator, advance }),
        ]
    }

    fn operator(id: u64) -> Address {
        addr(500 + id)
    }

    proptest! {
        /// Power equals the brute-force sum over pairs active at the query time.
        #[test]
        fn power_is_sum_over_active_pairs(
            vaults in prop::collection::vec(arb_vault(), 1..6),
            subnet_pause in prop::option::of(1u64..100),
            at in 0u64..120,
        ) {
            let net = TestNetwork::new(WINDOW);
            let subnets = [subnetwork(1), subnetwork(2), subnetwork(3)];
            for subnet in subnets {
                net.service.register_subnetwork(subnet).unwrap();
            }

            let mut registered = Vec::new();
            for (i, plan) in vaults.iter().enumerate() {
                let id = 10 + i as u64;
                let vault = match plan.owner {
                    None => {
                        let vault = net.add_shared_vault(id, WINDOW);
                        net.service.register_shared_vault(vault).unwrap();
                        vault
                    }
                    Some(owner) => {
                        let vault = net.add_exclusive_vault(id, operator(owner), WINDOW);
                        net.service.register_operator_vault(operator(owner), vault).unwrap();
                        vault
                    }
                };
                for (subnet, stake) in subnets.iter().zip(&plan.stakes) {
                    for owner in 0..3 {
                        net.stake(vault, *subnet, operator(owner), 0, stake + owner);
                    }
                }
                registered.push(vault);
            }

            let mut pauses: Vec<(u64, usize)> = vaults
                .iter()
                .enumerate()
                .filter_map(|(i, plan)| plan.paused_at.map(|t| (t, i)))
                .collect();
            pauses.sort();
            let mut subnet_paused = false;
            for (t, i) in pauses {
                if let Some(pause) = subnet_pause.filter(|pause| *pause <= t && !subnet_paused) {
                    net.at(pause);
                    net.service.pause_subnetwork(subnets[0]).unwrap();
                    subnet_paused = true;
                }
                net.at(t);
                match vaults[i].owner {
                    None => net.service.pause_shared_vault(registered[i]).unwrap(),
                    Some(owner) => net
                        .service
                        .pause_operator_vault(operator(owner), registered[i])
                        .unwrap(),
                }
            }
            if let Some(pause) = subnet_pause.filter(|_| !subnet_paused) {
                net.at(net.service.now().max(pause));
                net.service.pause_subnetwork(subnets[0]).unwrap();
            }
            let subnet_disabled = net
                .service
                .subnetwork_with_times_at(0)
                .and_then(|entry| entry.window.disabled_at);

            for owner in 0..3 {
                let mut expected = U256::zero();
                for (i, plan) in vaults.iter().enumerate() {
                    let usable = plan.owner.map_or(true, |o| o == owner);
                    let vault_active = plan.paused_at.map_or(true, |p| at < p);
                    if !usable || !vault_active {
                        continue;
                    }
                    for (s, stake) in plan.stakes.iter().enumerate() {
                        let subnet_active = s != 0 || subnet_disabled.map_or(true, |p| at < p);
                        if subnet_active {
                            expected += U256::from(stake + owner);
                        }
                    }
                }
                prop_assert_eq!(
                    net.service.operator_power_at(&operator(owner), at).unwrap(),
                    expected
                );
            }
        }

        /// Whatever order registrations arrive in, no vault ends up in two roles.
        #[test]
        fn vault_roles_stay_exclusive(
            attempts in prop::collection::vec((0u64..4, prop::option::of(0u64..3)), 1..30),
        ) {
            let net = TestNetwork::new(WINDOW);
            let mut registered: HashSet<u64> = HashSet::new();

            for (id, owner) in attempts {
                let vault = addr(10 + id);
                let result = match owner {
                    None => {
                        if !registered.contains(&id) {
                            net.add_shared_vault(10 + id, WINDOW);
                        }
                        net.service.register_shared_vault(vault)
                    }
                    Some(owner) => {
                        if !registered.contains(&id) {
                            net.add_exclusive_vault(10 + id, operator(owner), WINDOW);
                        }
                        net.service.register_operator_vault(operator(owner), vault)
                    }
                };
                if registered.insert(id) {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert!(result.is_err());
                }

                let snapshot = net.service.snapshot();
                prop_assert!(invariant_vault_exclusivity(&snapshot.membership));
                prop_assert!(invariant_vault_reverse_map(&snapshot.membership));
            }
        }

        /// Rotations accepted or rejected, the key registry stays consistent.
        #[test]
        fn key_rotation_keeps_invariants(ops in prop::collection::vec(arb_key_op(), 1..40)) {
            let net = TestNetwork::new(WINDOW);
            let mut now = 0;

            for op in ops {
                let (who, new_key, advance) = match op {
                    KeyOp::Update { operator: who, key: k, advance } => (who, key(k), advance),
                    KeyOp::Clear { operator: who, advance } => (who, OperatorKey::ZERO, advance),
                };
                now += advance;
                net.at(now);
                let before = net.service.operator_key(&operator(who));

                match net.service.update_operator_key(operator(who), new_key) {
                    Ok(()) => prop_assert_eq!(net.service.operator_key(&operator(who)), new_key),
                    Err(_) => {
                        prop_assert_eq!(net.service.operator_key(&operator(who)), before)
                    }
                }

                let snapshot = net.service.snapshot();
                prop_assert!(invariant_key_bounds(&snapshot.keys));
                prop_assert!(invariant_key_uniqueness(&snapshot.keys));
                if !new_key.is_zero() && net.service.operator_key(&operator(who)) == new_key {
                    prop_assert_eq!(net.service.operator_by_key(&new_key), operator(who));
                }
            }
        }
    }
}
