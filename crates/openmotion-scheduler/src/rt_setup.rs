//! Realtime thread setup configuration.

use crate::DEFAULT_SCHED_PRIORITY;

/// Realtime parameters applied to the consumer thread.
///
/// Step timing degrades badly when the consumer gets preempted or page
/// faults mid-sleep, so the defaults request FIFO scheduling and locked
/// memory. Both are best-effort: denial downgrades to a warning.
#[derive(Debug, Clone)]
pub struct RtSetup {
    /// Enable `SCHED_FIFO` scheduling for the consumer thread.
    pub high_priority: bool,

    /// FIFO priority to request when `high_priority` is set.
    pub priority: i32,

    /// Lock current and future memory pages to prevent page faults
    /// during step generation.
    pub lock_memory: bool,
}

impl Default for RtSetup {
    fn default() -> Self {
        Self {
            high_priority: true,
            priority: DEFAULT_SCHED_PRIORITY,
            lock_memory: true,
        }
    }
}

impl RtSetup {
    /// Create a new RtSetup with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a minimal RtSetup (no special configuration).
    pub fn minimal() -> Self {
        Self {
            high_priority: false,
            priority: DEFAULT_SCHED_PRIORITY,
            lock_memory: false,
        }
    }

    /// Set high priority.
    pub fn with_high_priority(mut self, enabled: bool) -> Self {
        self.high_priority = enabled;
        self
    }

    /// Set the FIFO priority value.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set memory locking.
    pub fn with_lock_memory(mut self, enabled: bool) -> Self {
        self.lock_memory = enabled;
        self
    }

    /// Check if any realtime features are enabled.
    pub fn has_rt_features(&self) -> bool {
        self.high_priority || self.lock_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let setup = RtSetup::default();
        assert!(setup.high_priority);
        assert!(setup.lock_memory);
        assert_eq!(setup.priority, DEFAULT_SCHED_PRIORITY);
    }

    #[test]
    fn test_minimal() {
        let setup = RtSetup::minimal();
        assert!(!setup.high_priority);
        assert!(!setup.lock_memory);
        assert!(!setup.has_rt_features());
    }

    #[test]
    fn test_builder_pattern() {
        let setup = RtSetup::new()
            .with_high_priority(false)
            .with_priority(55)
            .with_lock_memory(true);

        assert!(!setup.high_priority);
        assert_eq!(setup.priority, 55);
        assert!(setup.lock_memory);
    }

    #[test]
    fn test_has_rt_features() {
        let minimal = RtSetup::minimal();
        assert!(!minimal.has_rt_features());

        let with_lock = RtSetup::minimal().with_lock_memory(true);
        assert!(with_lock.has_rt_features());
    }
}
