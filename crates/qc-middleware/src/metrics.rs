//! # Middleware Metrics
//!
//! Prometheus counters for registry mutations and slashing.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-middleware = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `middleware_registrations_total` - Registry transitions (by domain and action)
//! - `middleware_slashes_total` - Dispatched slashes (by slasher variant)
//! - `middleware_slashes_rejected_total` - Rejected slash calls (by reason)
//! - `middleware_key_rotations_total` - Successful key updates

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Registry transitions, labeled by domain (subnetwork, shared_vault,
    /// operator_vault) and action (register, pause, unpause, unregister)
    pub static ref REGISTRATIONS: IntCounterVec = register_int_counter_vec!(
        "middleware_registrations_total",
        "Total number of registry transitions",
        &["domain", "action"]
    )
    .expect("Failed to create REGISTRATIONS metric");

    /// Dispatched slashes, labeled by slasher variant
    pub static ref SLASHES: IntCounterVec = register_int_counter_vec!(
        "middleware_slashes_total",
        "Total number of slashes dispatched",
        &["variant"]
    )
    .expect("Failed to create SLASHES metric");

    /// Rejected slash calls, labeled by error reason
    pub static ref SLASHES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "middleware_slashes_rejected_total",
        "Total number of slash calls rejected",
        &["reason"]
    )
    .expect("Failed to create SLASHES_REJECTED metric");

    /// Successful key updates
    pub static ref KEY_ROTATIONS: IntCounter = register_int_counter!(
        "middleware_key_rotations_total",
        "Total number of operator key updates"
    )
    .expect("Failed to create KEY_ROTATIONS metric");
}

/// Record a registry transition
#[cfg(feature = "metrics")]
pub fn record_transition(domain: &str, action: &str) {
    REGISTRATIONS.with_label_values(&[domain, action]).inc();
}

/// Record a dispatched slash
#[cfg(feature = "metrics")]
pub fn record_slash(variant: &str) {
    SLASHES.with_label_values(&[variant]).inc();
}

/// Record a rejected slash with reason
#[cfg(feature = "metrics")]
pub fn record_slash_rejected(reason: &str) {
    SLASHES_REJECTED.with_label_values(&[reason]).inc();
}

/// Record a key update
#[cfg(feature = "metrics")]
pub fn record_key_rotation() {
    KEY_ROTATIONS.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_transition(_domain: &str, _action: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_slash(_variant: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_slash_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_key_rotation() {}
