//! # Quantum-Chain Middleware Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # TestNetwork harness over the in-memory collateral
//! └── integration/      # Multi-step scenarios and property tests
//!     ├── lifecycle.rs
//!     ├── slashing.rs
//!     └── properties.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # With middleware logs
//! RUST_LOG=qc_middleware=debug cargo test -p qc-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod integration;

use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call from
/// every test; only the first call installs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
