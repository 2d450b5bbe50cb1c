//! Configuration for the restaking middleware

use crate::domain::{MiddlewareError, MiddlewareResult};
use serde::{Deserialize, Serialize};
use std::env;

/// One week, in seconds.
pub const DEFAULT_SLASHING_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Middleware configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Cool-down for every pause -> unpause/unregister transition, and the
    /// maximum age of a slash reference timestamp (seconds).
    pub slashing_window: u64,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            slashing_window: DEFAULT_SLASHING_WINDOW_SECS,
        }
    }
}

impl MiddlewareConfig {
    /// Validated configuration with the given window.
    pub fn new(slashing_window: u64) -> MiddlewareResult<Self> {
        let config = Self { slashing_window };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SLASHING_WINDOW_SECS`: Slashing window (default: 604800)
    ///
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            slashing_window: env::var("QC_SLASHING_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SLASHING_WINDOW_SECS),
        }
    }

    pub fn validate(&self) -> MiddlewareResult<()> {
        // A zero window would allow pause and unregister in the same second
        if self.slashing_window == 0 {
            return Err(MiddlewareError::InvalidConfig(
                "slashing_window cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}
