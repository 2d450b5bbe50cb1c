//! Adapters layer
//!
//! Concrete implementations of the outbound ports.

pub mod in_memory;
pub mod power_policy;
pub mod time;

pub use in_memory::{InMemoryCollateral, SlashRecord, VaultRecord};
pub use power_policy::EqualStakePower;
pub use time::{EpochCaptureTimeSource, ManualClock};
