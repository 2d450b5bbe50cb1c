//! Ports layer (Hexagonal Architecture)
//!
//! Inbound: [`MiddlewareApi`]. Outbound: the collateral, delegator and
//! slasher gateways, the stake-to-power policy and the time source.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
