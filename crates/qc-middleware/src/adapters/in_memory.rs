//! In-memory collateral adapter
//!
//! One table-backed implementation of the collateral, delegator and slasher
//! gateways, for tests, benchmarks and local simulation.

use crate::domain::{
    Address, DelegatorKind, GatewayError, SubnetworkId, Timestamp, INSTANT_SLASHER_TYPE, U256,
    VETO_SLASHER_TYPE,
};
use crate::ports::{CollateralGateway, DelegatorGateway, SlasherGateway};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Configuration of a single vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultRecord {
    pub initialized: bool,
    pub epoch_duration: u64,
    pub delegator: Address,
    pub slasher: Option<Address>,
}

impl VaultRecord {
    /// An initialized vault without a slasher.
    pub fn new(epoch_duration: u64, delegator: Address) -> Self {
        Self {
            initialized: true,
            epoch_duration,
            delegator,
            slasher: None,
        }
    }

    pub fn with_slasher(mut self, slasher: Address) -> Self {
        self.slasher = Some(slasher);
        self
    }

    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }
}

/// A slash seized by an instant slasher or an executed veto request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashRecord {
    pub slasher: Address,
    pub subnetwork: SubnetworkId,
    pub operator: Address,
    pub amount: U256,
    pub capture_timestamp: Timestamp,
}

#[derive(Clone, Copy, Debug)]
struct SlasherRecord {
    slasher_type: u64,
    veto_duration: u64,
}

#[derive(Debug)]
struct PendingRequest {
    record: SlashRecord,
    executed: bool,
}

type StakeKey = (Address, SubnetworkId, Address);

#[derive(Default)]
struct Tables {
    vaults: HashMap<Address, VaultRecord>,
    delegators: HashMap<Address, DelegatorKind>,
    /// Stake checkpoints; the value at `t` is the last one at or before `t`
    stakes: HashMap<StakeKey, BTreeMap<Timestamp, U256>>,
    slashers: HashMap<Address, SlasherRecord>,
    requests: HashMap<Address, Vec<PendingRequest>>,
    slashed: Vec<SlashRecord>,
    unavailable: bool,
}

/// In-memory collateral registry
#[derive(Default)]
pub struct InMemoryCollateral {
    tables: RwLock<Tables>,
}

impl InMemoryCollateral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vault(&self, vault: Address, record: VaultRecord) {
        self.tables.write().vaults.insert(vault, record);
    }

    pub fn add_delegator(&self, delegator: Address, kind: DelegatorKind) {
        self.tables.write().delegators.insert(delegator, kind);
    }

    pub fn add_instant_slasher(&self, slasher: Address) {
        self.add_slasher(slasher, INSTANT_SLASHER_TYPE, 0);
    }

    pub fn add_veto_slasher(&self, slasher: Address, veto_duration: u64) {
        self.add_slasher(slasher, VETO_SLASHER_TYPE, veto_duration);
    }

    /// Register a slasher with an arbitrary `TYPE()` tag.
    pub fn add_slasher(&self, slasher: Address, slasher_type: u64, veto_duration: u64) {
        self.tables.write().slashers.insert(
            slasher,
            SlasherRecord {
                slasher_type,
                veto_duration,
            },
        );
    }

    /// Checkpoint the stake of `operator` in `subnetwork` from `timestamp` on.
    pub fn set_stake(
        &self,
        delegator: Address,
        subnetwork: SubnetworkId,
        operator: Address,
        timestamp: Timestamp,
        amount: U256,
    ) {
        self.tables
            .write()
            .stakes
            .entry((delegator, subnetwork, operator))
            .or_default()
            .insert(timestamp, amount);
    }

    /// Make every gateway call fail with [`GatewayError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.tables.write().unavailable = unavailable;
    }

    /// Slashes seized so far, in order.
    pub fn slashed(&self) -> Vec<SlashRecord> {
        self.tables.read().slashed.clone()
    }

    /// Veto requests of `slasher` not yet executed.
    pub fn pending_requests(&self, slasher: &Address) -> usize {
        self.tables
            .read()
            .requests
            .get(slasher)
            .map_or(0, |queue| queue.iter().filter(|req| !req.executed).count())
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&Tables) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let tables = self.tables.read();
        if tables.unavailable {
            return Err(GatewayError::Unavailable("collateral tables offline".into()));
        }
        f(&tables)
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut tables = self.tables.write();
        if tables.unavailable {
            return Err(GatewayError::Unavailable("collateral tables offline".into()));
        }
        f(&mut tables)
    }
}

impl Tables {
    fn vault(&self, vault: &Address) -> Result<&VaultRecord, GatewayError> {
        self.vaults
            .get(vault)
            .ok_or_else(|| GatewayError::InvalidResponse(format!("unknown vault {:?}", vault)))
    }

    fn slasher(&self, slasher: &Address) -> Result<SlasherRecord, GatewayError> {
        self.slashers
            .get(slasher)
            .copied()
            .ok_or_else(|| {
                GatewayError::InvalidResponse(format!("unknown slasher {:?}", slasher))
            })
    }
}

impl CollateralGateway for InMemoryCollateral {
    fn is_collateral_entity(&self, vault: &Address) -> Result<bool, GatewayError> {
        self.read(|tables| Ok(tables.vaults.contains_key(vault)))
    }

    fn is_initialized(&self, vault: &Address) -> Result<bool, GatewayError> {
        self.read(|tables| Ok(tables.vault(vault)?.initialized))
    }

    fn epoch_duration(&self, vault: &Address) -> Result<u64, GatewayError> {
        self.read(|tables| Ok(tables.vault(vault)?.epoch_duration))
    }

    fn delegator(&self, vault: &Address) -> Result<Address, GatewayError> {
        self.read(|tables| Ok(tables.vault(vault)?.delegator))
    }

    fn slasher(&self, vault: &Address) -> Result<Option<Address>, GatewayError> {
        self.read(|tables| Ok(tables.vault(vault)?.slasher))
    }
}

impl DelegatorGateway for InMemoryCollateral {
    fn delegator_kind(&self, delegator: &Address) -> Result<DelegatorKind, GatewayError> {
        self.read(|tables| {
            tables.delegators.get(delegator).copied().ok_or_else(|| {
                GatewayError::InvalidResponse(format!("unknown delegator {:?}", delegator))
            })
        })
    }

    fn stake_at(
        &self,
        delegator: &Address,
        subnetwork: &SubnetworkId,
        operator: &Address,
        timestamp: Timestamp,
        _hints: &[u8],
    ) -> Result<U256, GatewayError> {
        self.read(|tables| {
            let stake = tables
                .stakes
                .get(&(*delegator, *subnetwork, *operator))
                .and_then(|checkpoints| checkpoints.range(..=timestamp).next_back())
                .map_or(U256::zero(), |(_, amount)| *amount);
            Ok(stake)
        })
    }
}

impl SlasherGateway for InMemoryCollateral {
    fn slasher_type(&self, slasher: &Address) -> Result<u64, GatewayError> {
        self.read(|tables| Ok(tables.slasher(slasher)?.slasher_type))
    }

    fn veto_duration(&self, slasher: &Address) -> Result<u64, GatewayError> {
        self.read(|tables| Ok(tables.slasher(slasher)?.veto_duration))
    }

    fn slash(
        &self,
        slasher: &Address,
        subnetwork: &SubnetworkId,
        operator: &Address,
        amount: U256,
        capture_timestamp: Timestamp,
        _hints: &[u8],
    ) -> Result<U256, GatewayError> {
        self.write(|tables| {
            if tables.slasher(slasher)?.slasher_type != INSTANT_SLASHER_TYPE {
                return Err(GatewayError::Rejected("not an instant slasher".into()));
            }
            tables.slashed.push(SlashRecord {
                slasher: *slasher,
                subnetwork: *subnetwork,
                operator: *operator,
                amount,
                capture_timestamp,
            });
            Ok(amount)
        })
    }

    fn request_slash(
        &self,
        slasher: &Address,
        subnetwork: &SubnetworkId,
        operator: &Address,
        amount: U256,
        capture_timestamp: Timestamp,
        _hints: &[u8],
    ) -> Result<u64, GatewayError> {
        self.write(|tables| {
            if tables.slasher(slasher)?.slasher_type != VETO_SLASHER_TYPE {
                return Err(GatewayError::Rejected("not a veto slasher".into()));
            }
            let queue = tables.requests.entry(*slasher).or_default();
            queue.push(PendingRequest {
                record: SlashRecord {
                    slasher: *slasher,
                    subnetwork: *subnetwork,
                    operator: *operator,
                    amount,
                    capture_timestamp,
                },
                executed: false,
            });
            Ok((queue.len() - 1) as u64)
        })
    }

    fn execute_slash(
        &self,
        slasher: &Address,
        request_index: u64,
        _hints: &[u8],
    ) -> Result<U256, GatewayError> {
        self.write(|tables| {
            let unknown =
                || GatewayError::Rejected(format!("unknown slash request {}", request_index));
            let index = usize::try_from(request_index).map_err(|_| unknown())?;
            let request = tables
                .requests
                .get_mut(slasher)
                .and_then(|queue| queue.get_mut(index))
                .ok_or_else(unknown)?;
            if request.executed {
                return Err(GatewayError::Rejected(format!(
                    "slash request {} already executed",
                    request_index
                )));
            }
            request.executed = true;
            let record = request.record.clone();
            let amount = record.amount;
            tables.slashed.push(record);
            Ok(amount)
        })
    }
}
