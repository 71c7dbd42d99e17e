//! Error types for the scheduler crate.

use std::fmt;
use std::fmt::Display;

/// Scheduler error codes (pre-allocated for the consumer's hot path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedError {
    /// Failed to apply realtime thread setup
    RtSetupFailed = 1,
    /// Absolute sleep failed for a reason other than signal interruption
    SleepFailed = 2,
}

impl Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::RtSetupFailed => write!(f, "Failed to apply realtime setup"),
            SchedError::SleepFailed => write!(f, "Absolute monotonic sleep failed"),
        }
    }
}

impl std::error::Error for SchedError {}

/// Result type for scheduler operations
pub type SchedResult<T = ()> = Result<T, SchedError>;
