//! Time source adapters
//!
//! - [`EpochCaptureTimeSource`]: "now" is the start of the current epoch, so
//!   every query inside one epoch sees the same capture timestamp.
//! - [`ManualClock`]: a shared, settable clock for tests and simulations.

use crate::domain::{MiddlewareError, MiddlewareResult, Timestamp};
use crate::ports::TimeSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Capture timestamps aligned to fixed-length epochs.
pub struct EpochCaptureTimeSource {
    genesis: Timestamp,
    epoch_duration: u64,
    clock: Box<dyn TimeSource>,
}

impl EpochCaptureTimeSource {
    pub fn new(
        genesis: Timestamp,
        epoch_duration: u64,
        clock: Box<dyn TimeSource>,
    ) -> MiddlewareResult<Self> {
        if epoch_duration == 0 {
            return Err(MiddlewareError::InvalidConfig(
                "epoch_duration cannot be 0".to_string(),
            ));
        }
        Ok(Self {
            genesis,
            epoch_duration,
            clock,
        })
    }

    /// Epoch containing the inner clock's time; 0 before genesis.
    pub fn current_epoch(&self) -> u64 {
        let now = self.clock.now();
        if now < self.genesis {
            return 0;
        }
        (now - self.genesis) / self.epoch_duration
    }

    /// First timestamp of `epoch`.
    pub fn epoch_start(&self, epoch: u64) -> Timestamp {
        self.genesis
            .saturating_add(epoch.saturating_mul(self.epoch_duration))
    }
}

impl TimeSource for EpochCaptureTimeSource {
    fn now(&self) -> Timestamp {
        self.epoch_start(self.current_epoch())
    }
}

/// Settable clock; clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
