//! Linux-specific realtime setup and high-precision absolute sleep.

use core::time::Duration;
use libc::{
    CLOCK_MONOTONIC, EINTR, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, clock_nanosleep, mlockall,
    sched_param, sched_setscheduler, timespec,
};
use std::time::Instant;

use crate::error::{SchedError, SchedResult};
use crate::rt_setup::RtSetup;

/// Linux-specific sleep implementation.
pub struct PlatformSleep;

impl PlatformSleep {
    /// Create new platform sleep instance.
    pub fn new() -> Self {
        Self
    }

    /// Apply Linux-specific realtime setup to the calling thread.
    ///
    /// Failure to enter `SCHED_FIFO` (no `CAP_SYS_NICE`, containers,
    /// unprivileged users) is reported so callers can degrade to default
    /// priority. A failed `mlockall` is ignored.
    pub fn apply_rt_setup(&self, setup: &RtSetup) -> SchedResult {
        unsafe {
            if setup.high_priority {
                let param = sched_param {
                    sched_priority: setup.priority,
                };

                if sched_setscheduler(0, SCHED_FIFO, &param) != 0 {
                    return Err(SchedError::RtSetupFailed);
                }
            }

            if setup.lock_memory {
                mlockall(MCL_CURRENT | MCL_FUTURE);
            }
        }

        Ok(())
    }

    /// Sleep until an absolute deadline on the monotonic clock.
    ///
    /// Uses clock_nanosleep for the bulk of the wait, then busy-spins for
    /// the final ~80 microseconds for precision. Signal interruption returns
    /// early; the caller observes the clock again.
    pub fn sleep_until(&self, target: Instant) -> SchedResult {
        let now = Instant::now();
        if target <= now {
            return Ok(());
        }

        let duration = target.duration_since(now);

        // For very short durations, just busy-spin
        if duration.as_micros() < 100 {
            while Instant::now() < target {
                std::hint::spin_loop();
            }
            return Ok(());
        }

        // Sleep until ~80µs before target, then busy-spin
        let sleep_duration = duration.saturating_sub(Duration::from_micros(80));

        let ts = timespec {
            tv_sec: sleep_duration.as_secs() as i64,
            tv_nsec: i64::from(sleep_duration.subsec_nanos()),
        };

        let result = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut()) };

        if result == EINTR {
            return Ok(());
        }
        if result != 0 {
            return Err(SchedError::SleepFailed);
        }

        // Busy-spin for final precision
        while Instant::now() < target {
            std::hint::spin_loop();
        }

        Ok(())
    }
}

impl Default for PlatformSleep {
    fn default() -> Self {
        Self::new()
    }
}
