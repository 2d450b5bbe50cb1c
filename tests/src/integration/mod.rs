//! # Integration Scenarios
//!
//! Multi-step flows against the full service: membership lifecycles across
//! cool-downs, slashing against historical membership, key rotation, and
//! property tests over randomly generated memberships.

mod lifecycle;
mod properties;
mod slashing;
