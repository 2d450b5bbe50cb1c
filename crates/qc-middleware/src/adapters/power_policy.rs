//! Stake-to-power policies

use crate::domain::{Address, U256};
use crate::ports::StakePowerPolicy;

/// Power equals stake, for every vault.
#[derive(Clone, Copy, Debug, Default)]
pub struct EqualStakePower;

impl StakePowerPolicy for EqualStakePower {
    fn stake_to_power(&self, _vault: &Address, stake: U256) -> U256 {
        stake
    }
}
