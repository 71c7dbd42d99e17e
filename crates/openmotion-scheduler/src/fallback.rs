//! Portable fallback for platforms without realtime primitives.

use std::time::Instant;

use crate::error::SchedResult;
use crate::rt_setup::RtSetup;

/// Fallback sleep implementation.
pub struct PlatformSleep;

impl PlatformSleep {
    /// Create new platform sleep instance.
    pub fn new() -> Self {
        Self
    }

    /// No realtime setup is available; succeed so callers keep running at
    /// default priority.
    pub fn apply_rt_setup(&self, _setup: &RtSetup) -> SchedResult {
        Ok(())
    }

    /// Relative sleep to the deadline.
    pub fn sleep_until(&self, target: Instant) -> SchedResult {
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        }
        Ok(())
    }
}

impl Default for PlatformSleep {
    fn default() -> Self {
        Self::new()
    }
}
