//! # Membership Lifecycle Flows
//!
//! Subnetworks, shared vaults and operator vaults moving through
//! register → pause → cool-down → unpause/unregister while power queries run
//! against past and present capture timestamps.

#[cfg(test)]
mod tests {
    use crate::fixtures::{addr, key, subnetwork, TestNetwork};
    use crate::init_tracing;
    use qc_middleware::{MiddlewareApi, MiddlewareError, MiddlewareService, SetError, U256};

    const WINDOW: u64 = 7 * 24 * 60 * 60;

    // =============================================================================
    // MEMBERSHIP OVER TIME
    // =============================================================================

    #[test]
    fn test_power_follows_membership_history() {
        init_tracing();
        let net = TestNetwork::new(WINDOW);
        let operator = addr(1);
        let (s1, s2) = (subnetwork(1), subnetwork(2));

        net.at(1_000);
        net.service.register_subnetwork(s1).unwrap();
        net.service.register_subnetwork(s2).unwrap();
        let shared = net.add_shared_vault(10, 2 * WINDOW);
        let own = net.add_exclusive_vault(11, operator, WINDOW);
        net.service.register_shared_vault(shared).unwrap();
        net.service.register_operator_vault(operator, own).unwrap();

        net.stake(shared, s1, operator, 0, 100);
        net.stake(shared, s2, operator, 0, 200);
        net.stake(own, s1, operator, 0, 10);
        net.stake(own, s2, operator, 5_000, 20);

        assert_eq!(net.service.operator_power_at(&operator, 1_000).unwrap(), U256::from(310));
        assert_eq!(net.service.operator_power_at(&operator, 5_000).unwrap(), U256::from(330));
        // Nothing registered yet
        assert_eq!(net.service.operator_power_at(&operator, 999).unwrap(), U256::zero());

        net.at(6_000);
        net.service.pause_subnetwork(s2).unwrap();
        net.service.pause_shared_vault(shared).unwrap();
        assert_eq!(net.service.operator_power(&operator).unwrap(), U256::from(10));
        assert_eq!(net.service.operator_power_at(&operator, 5_999).unwrap(), U256::from(330));

        // Cool-down runs from the pause
        net.at(6_000 + WINDOW - 1);
        assert!(matches!(
            net.service.unpause_subnetwork(s2),
            Err(MiddlewareError::Subnetwork {
                source: SetError::CoolDownNotElapsed { .. },
                ..
            })
        ));

        net.at(6_000 + WINDOW);
        net.service.unpause_subnetwork(s2).unwrap();
        net.service.unregister_shared_vault(shared).unwrap();
        assert_eq!(net.service.operator_power(&operator).unwrap(), U256::from(30));
        // Unregistered vault history is gone and s2 restarted at the unpause
        assert_eq!(net.service.operator_power_at(&operator, 5_000).unwrap(), U256::from(10));
    }

    #[test]
    fn test_vault_can_switch_role_after_unregister() {
        init_tracing();
        let net = TestNetwork::new(WINDOW);
        let operator = addr(1);
        let vault = net.add_exclusive_vault(10, operator, WINDOW);

        net.service.register_operator_vault(operator, vault).unwrap();
        assert_eq!(
            net.service.register_shared_vault(vault),
            Err(MiddlewareError::VaultAlreadyRegistered(vault))
        );

        net.at(1);
        net.service.pause_operator_vault(operator, vault).unwrap();
        net.at(1 + WINDOW);
        net.service.unregister_operator_vault(operator, vault).unwrap();

        // Collateral side now delegates to everyone
        let shared = net.add_shared_vault(10, WINDOW);
        net.service.register_shared_vault(shared).unwrap();
        assert_eq!(net.service.active_operator_vaults(&addr(2)), vec![shared]);
    }

    #[test]
    fn test_operator_views_are_isolated() {
        let net = TestNetwork::new(WINDOW);
        let (alice, bob) = (addr(1), addr(2));
        let shared = net.add_shared_vault(10, WINDOW);
        let alice_vault = net.add_exclusive_vault(11, alice, WINDOW);
        let bob_vault = net.add_exclusive_vault(12, bob, WINDOW);

        net.service.register_shared_vault(shared).unwrap();
        net.service.register_operator_vault(alice, alice_vault).unwrap();
        net.service.register_operator_vault(bob, bob_vault).unwrap();

        let mut alice_view = net.service.active_operator_vaults(&alice);
        alice_view.sort();
        let mut expected = vec![shared, alice_vault];
        expected.sort();
        assert_eq!(alice_view, expected);
        assert!(!net.service.vault_was_active_at(0, &alice, &bob_vault));
        assert_eq!(net.service.active_vaults().len(), 3);

        // Bob cannot touch Alice's vault
        assert!(matches!(
            net.service.pause_operator_vault(bob, alice_vault),
            Err(MiddlewareError::OperatorVault {
                source: SetError::NotRegistered,
                ..
            })
        ));
    }

    // =============================================================================
    // KEYS
    // =============================================================================

    #[test]
    fn test_key_history_survives_rotation() {
        init_tracing();
        let net = TestNetwork::new(WINDOW);
        let operator = addr(1);

        net.at(100);
        net.service.update_operator_key(operator, key(1)).unwrap();
        net.at(200);
        net.service.update_operator_key(operator, key(2)).unwrap();

        assert_eq!(net.service.operator_key_at(&operator, 150), key(1));
        assert_eq!(net.service.operator_key(&operator), key(2));
        assert!(net.service.key_was_active_at(199, &key(1)));
        assert!(!net.service.key_was_active_at(200, &key(1)));
        // Still reserved while it cools down
        assert_eq!(
            net.service.update_operator_key(addr(2), key(1)),
            Err(MiddlewareError::DuplicateKey(key(1)))
        );

        net.at(200 + WINDOW);
        net.service.update_operator_key(operator, key(3)).unwrap();
        net.service.update_operator_key(addr(2), key(1)).unwrap();
        assert_eq!(net.service.operator_by_key(&key(1)), addr(2));
        assert_eq!(net.service.operator_key_at(&operator, 250), key(2));
    }

    // =============================================================================
    // RESTART
    // =============================================================================

    #[test]
    fn test_snapshot_survives_serialization_round_trip() {
        let net = TestNetwork::new(WINDOW);
        let operator = addr(1);
        net.service.register_subnetwork(subnetwork(1)).unwrap();
        let vault = net.add_exclusive_vault(10, operator, WINDOW);
        net.service.register_operator_vault(operator, vault).unwrap();
        net.stake(vault, subnetwork(1), operator, 0, 42);
        net.at(5);
        net.service.pause_operator_vault(operator, vault).unwrap();

        let json = serde_json::to_vec(&net.service.snapshot()).unwrap();
        let restored = MiddlewareService::from_snapshot(
            TestNetwork::dependencies(&net.collateral, WINDOW),
            serde_json::from_slice(&json).unwrap(),
        )
        .unwrap()
        .with_time_source(Box::new(net.clock.clone()));

        let api: &dyn MiddlewareApi = &restored;
        assert_eq!(api.operator_power_at(&operator, 4).unwrap(), U256::from(42));
        assert_eq!(api.operator_power_at(&operator, 5).unwrap(), U256::zero());
        // Pause timestamp survived, so the cool-down still applies
        assert!(restored.unpause_operator_vault(operator, vault).is_err());
        net.at(5 + WINDOW);
        restored.unpause_operator_vault(operator, vault).unwrap();
    }
}
