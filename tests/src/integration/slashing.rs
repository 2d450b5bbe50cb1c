//! # Slashing Flows
//!
//! Slashes against historical membership, through both slasher variants,
//! with the capture-timestamp time source the service runs under in
//! production.

#[cfg(test)]
mod tests {
    use crate::fixtures::{addr, subnetwork, TestNetwork};
    use crate::init_tracing;
    use qc_middleware::adapters::{EpochCaptureTimeSource, ManualClock};
    use qc_middleware::{
        ErrorKind, MiddlewareError, MiddlewareService, SlashOutcome, SlasherVariant, TimeSource,
        U256,
    };

    const WINDOW: u64 = 100;

    #[test]
    fn test_slash_inside_window_after_operator_leaves() {
        init_tracing();
        let net = TestNetwork::new(WINDOW);
        let operator = addr(1);
        let slasher = addr(900);
        let vault = net.add_exclusive_vault(10, operator, 4 * WINDOW);
        net.collateral.add_instant_slasher(slasher);
        net.attach_slasher(vault, 4 * WINDOW, slasher);
        net.service.register_subnetwork(subnetwork(1)).unwrap();
        net.service.register_operator_vault(operator, vault).unwrap();

        // Misbehaviour at 40, operator pauses at 50 to dodge the slash
        net.at(50);
        net.service.pause_operator_vault(operator, vault).unwrap();

        net.at(120);
        let response = net
            .service
            .slash_vault(40, vault, subnetwork(1), operator, U256::from(25), &[])
            .unwrap();
        assert_eq!(response.outcome, SlashOutcome::Slashed(U256::from(25)));

        // Cannot unregister while the evidence window is still open
        net.at(149);
        assert!(net.service.unregister_operator_vault(operator, vault).is_err());

        net.at(150);
        net.service.unregister_operator_vault(operator, vault).unwrap();
        assert!(matches!(
            net.service
                .slash_vault(40, vault, subnetwork(1), operator, U256::one(), &[]),
            Err(MiddlewareError::NotOperatorVault { .. })
        ));
    }

    #[test]
    fn test_veto_flow_queues_then_executes() {
        init_tracing();
        let net = TestNetwork::new(WINDOW);
        let operator = addr(1);
        let slasher = addr(900);
        let vault = net.add_shared_vault(10, 3 * WINDOW);
        net.collateral.add_veto_slasher(slasher, WINDOW);
        net.attach_slasher(vault, 3 * WINDOW, slasher);
        net.service.register_subnetwork(subnetwork(1)).unwrap();
        net.service.register_shared_vault(vault).unwrap();

        net.at(30);
        let first = net
            .service
            .slash_vault(10, vault, subnetwork(1), operator, U256::from(5), &[])
            .unwrap();
        let second = net
            .service
            .slash_vault(20, vault, subnetwork(1), operator, U256::from(6), &[])
            .unwrap();
        assert_eq!(first.slasher_variant, SlasherVariant::Veto);
        assert_eq!(first.request_index(), Some(0));
        assert_eq!(second.request_index(), Some(1));
        assert_eq!(net.collateral.pending_requests(&slasher), 2);

        assert_eq!(net.service.execute_slash(vault, 1, &[]).unwrap(), U256::from(6));
        assert_eq!(net.collateral.pending_requests(&slasher), 1);
        let slashed = net.collateral.slashed();
        assert_eq!(slashed.len(), 1);
        assert_eq!(slashed[0].capture_timestamp, 20);

        let err = net.service.execute_slash(vault, 7, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Collaborator);
    }

    #[test]
    fn test_veto_window_rejects_short_vault() {
        let net = TestNetwork::new(WINDOW);
        let slasher = addr(900);
        let vault = net.add_shared_vault(10, 3 * WINDOW);
        net.collateral.add_veto_slasher(slasher, 2 * WINDOW + 1);
        net.attach_slasher(vault, 3 * WINDOW, slasher);

        let err = net.service.register_shared_vault(vault).unwrap_err();
        assert!(matches!(err, MiddlewareError::VaultEpochTooShort { .. }));
        assert!(!err.is_retryable());
        assert!(net.service.active_vaults().is_empty());
    }

    #[test]
    fn test_capture_timestamp_source_drives_window() {
        init_tracing();
        let net = TestNetwork::new(WINDOW);
        let clock = ManualClock::new(0);
        let capture = EpochCaptureTimeSource::new(0, 60, Box::new(clock.clone())).unwrap();
        let service = MiddlewareService::new(TestNetwork::dependencies(&net.collateral, WINDOW))
            .unwrap()
            .with_time_source(Box::new(capture));

        let operator = addr(1);
        let slasher = addr(900);
        let vault = net.add_shared_vault(10, WINDOW);
        net.collateral.add_instant_slasher(slasher);
        net.attach_slasher(vault, WINDOW, slasher);

        clock.set(59);
        service.register_subnetwork(subnetwork(1)).unwrap();
        service.register_shared_vault(vault).unwrap();
        assert_eq!(service.now(), 0);
        assert!(service.vault_was_active_at(0, &operator, &vault));

        // Epoch 3 starts at 180; 0 + 100 < 180
        clock.set(200);
        assert_eq!(service.now(), 180);
        assert!(matches!(
            service.slash_vault(0, vault, subnetwork(1), operator, U256::one(), &[]),
            Err(MiddlewareError::TooOldTimestampSlash { now: 180, .. })
        ));
        service
            .slash_vault(80, vault, subnetwork(1), operator, U256::one(), &[])
            .unwrap();
        assert_eq!(clock.now(), 200);
    }
}
