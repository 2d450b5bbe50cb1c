//! # qc-middleware
//!
//! Restaking middleware: a time-windowed registry of subnetworks, vaults and
//! operator keys, operator power accounting, and slash dispatch.
//!
//! ## Architecture
//!
//! ```text
//!                    MiddlewareApi (inbound)
//!                            │
//!                   ┌────────┴────────┐
//!                   │MiddlewareService│──→ StakePowerPolicy
//!                   └────────┬────────┘──→ TimeSource
//!            ┌───────────────┼───────────────┐
//!            ↓               ↓               ↓
//!   MembershipRegistry   KeyRegistry   Collateral / Delegator /
//!            │               │          Slasher gateways
//!            └─WindowedSet───┘
//! ```
//!
//! Every stored subnetwork, vault and key carries one enable/disable window.
//! A paused entry stays queryable for one slashing window before it can be
//! unpaused or removed, so an operator cannot dodge a slash by toggling
//! membership.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_middleware::{MiddlewareConfig, MiddlewareDependencies, MiddlewareService};
//! use qc_middleware::adapters::{EqualStakePower, InMemoryCollateral};
//!
//! let collateral = Arc::new(InMemoryCollateral::new());
//! let service = MiddlewareService::new(MiddlewareDependencies {
//!     collateral: collateral.clone(),
//!     delegators: collateral.clone(),
//!     slashers: collateral,
//!     policy: Arc::new(EqualStakePower),
//!     config: MiddlewareConfig::from_env(),
//! })?;
//!
//! service.register_subnetwork(SubnetworkId::from_low_u64(7))?;
//! service.register_shared_vault(vault)?;
//! let power = service.operator_power(&operator)?;
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

// Re-export main types
pub use application::{MiddlewareDependencies, MiddlewareService, MiddlewareSnapshot, VaultRole};
pub use config::MiddlewareConfig;
pub use domain::{
    Address, DelegatorKind, ErrorKind, GatewayError, MiddlewareError, MiddlewareResult,
    OperatorKey, SetError, SlashOutcome, SlashResponse, SlasherVariant, SubnetworkId, Timestamp,
    Window, WindowedSet, U256, ZERO_ADDRESS,
};
pub use ports::{
    CollateralGateway, DelegatorGateway, MiddlewareApi, SlasherGateway, StakePowerPolicy,
    SystemTimeSource, TimeSource,
};
