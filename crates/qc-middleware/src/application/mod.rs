//! # Application Module
//!
//! The middleware service: membership transitions, key rotation, power
//! accounting and slash dispatch over the domain registries.

mod power;
pub mod service;
mod slashing;
pub mod state;


pub use service::{MiddlewareDependencies, MiddlewareService, VaultRole};
pub use state::{MiddlewareSnapshot, MiddlewareState};
