//! Power accounting
//!
//! Stake is read from the vault's delegator and turned into power by the
//! injected policy. Aggregates walk every active vault of the operator
//! against every active subnetwork, both taken at the same timestamp.
//! Shared collateral is counted once per operator; totals across operators
//! do not deduplicate it. Sums saturate at `U256::MAX`.

use super::service::MiddlewareService;
use crate::domain::{Address, MiddlewareResult, SubnetworkId, Timestamp, U256};
use crate::ports::{CollateralGateway, DelegatorGateway, SlasherGateway, StakePowerPolicy};
use tracing::trace;

impl<C, D, S, P> MiddlewareService<C, D, S, P>
where
    C: CollateralGateway,
    D: DelegatorGateway,
    S: SlasherGateway,
    P: StakePowerPolicy,
{
    /// Stake of `operator` in one vault and subnetwork at `timestamp`.
    pub fn operator_vault_stake_at(
        &self,
        operator: &Address,
        vault: &Address,
        subnetwork: &SubnetworkId,
        timestamp: Timestamp,
        hints: &[u8],
    ) -> MiddlewareResult<U256> {
        let delegator = self.collateral.delegator(vault)?;
        let stake = self
            .delegators
            .stake_at(&delegator, subnetwork, operator, timestamp, hints)?;
        Ok(stake)
    }

    /// Power of `operator` in one vault and subnetwork at `timestamp`.
    pub fn operator_vault_power_at(
        &self,
        operator: &Address,
        vault: &Address,
        subnetwork: &SubnetworkId,
        timestamp: Timestamp,
        hints: &[u8],
    ) -> MiddlewareResult<U256> {
        let stake = self.operator_vault_stake_at(operator, vault, subnetwork, timestamp, hints)?;
        Ok(self.policy.stake_to_power(vault, stake))
    }

    /// Stake of `operator` over all its active vaults and subnetworks.
    pub fn operator_stake_at(
        &self,
        operator: &Address,
        timestamp: Timestamp,
    ) -> MiddlewareResult<U256> {
        self.sum_active_pairs(
            std::slice::from_ref(operator),
            timestamp,
            |operator, vault, subnetwork| {
                self.operator_vault_stake_at(operator, vault, subnetwork, timestamp, &[])
            },
        )
    }

    pub fn operator_stake(&self, operator: &Address) -> MiddlewareResult<U256> {
        self.operator_stake_at(operator, self.now())
    }

    /// Power of `operator` over all its active vaults and subnetworks.
    pub fn operator_power_at(
        &self,
        operator: &Address,
        timestamp: Timestamp,
    ) -> MiddlewareResult<U256> {
        let power = self.sum_active_pairs(
            std::slice::from_ref(operator),
            timestamp,
            |operator, vault, subnetwork| {
                self.operator_vault_power_at(operator, vault, subnetwork, timestamp, &[])
            },
        )?;
        trace!(?operator, timestamp, %power, "Operator power computed");
        Ok(power)
    }

    pub fn operator_power(&self, operator: &Address) -> MiddlewareResult<U256> {
        self.operator_power_at(operator, self.now())
    }

    /// Sum of [`Self::operator_power_at`] over `operators`, all read from
    /// one view of the membership.
    pub fn total_power_at(
        &self,
        operators: &[Address],
        timestamp: Timestamp,
    ) -> MiddlewareResult<U256> {
        self.sum_active_pairs(operators, timestamp, |operator, vault, subnetwork| {
            self.operator_vault_power_at(operator, vault, subnetwork, timestamp, &[])
        })
    }

    pub fn total_power(&self, operators: &[Address]) -> MiddlewareResult<U256> {
        self.total_power_at(operators, self.now())
    }

    /// Sum of [`Self::operator_stake_at`] over `operators`, all read from
    /// one view of the membership.
    pub fn total_stake_at(
        &self,
        operators: &[Address],
        timestamp: Timestamp,
    ) -> MiddlewareResult<U256> {
        self.sum_active_pairs(operators, timestamp, |operator, vault, subnetwork| {
            self.operator_vault_stake_at(operator, vault, subnetwork, timestamp, &[])
        })
    }

    pub fn total_stake(&self, operators: &[Address]) -> MiddlewareResult<U256> {
        self.total_stake_at(operators, self.now())
    }

    fn sum_active_pairs<F>(
        &self,
        operators: &[Address],
        timestamp: Timestamp,
        value_of: F,
    ) -> MiddlewareResult<U256>
    where
        F: Fn(&Address, &Address, &SubnetworkId) -> MiddlewareResult<U256>,
    {
        // One consistent view of every operator's sets; released before delegator calls
        let (per_operator, subnetworks) = {
            let registry = self.state.membership.read();
            let per_operator: Vec<(&Address, Vec<Address>)> = operators
                .iter()
                .map(|operator| {
                    (operator, registry.active_operator_vaults_at(timestamp, operator))
                })
                .collect();
            (per_operator, registry.active_subnetworks_at(timestamp))
        };

        let mut total = U256::zero();
        for (operator, vaults) in &per_operator {
            for vault in vaults {
                for subnetwork in &subnetworks {
                    total = total.saturating_add(value_of(*operator, vault, subnetwork)?);
                }
            }
        }
        Ok(total)
    }
}
