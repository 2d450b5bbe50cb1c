//! # Shared Types Crate
//!
//! Identity and primitive value types used across the middleware.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: operator, vault, subnetwork and key
//!   identifiers are defined once, here.
//! - **Fixed Width**: addresses are 160-bit, keys are 256-bit, amounts are
//!   `U256`, timestamps are whole seconds.
//! - **Reserved Zero**: the all-zero address and the all-zero key mean
//!   "none" and are never valid registrations.

pub mod entities;

pub use entities::*;
