//! Prelude module for common scheduler types.

pub use crate::error::{SchedError, SchedResult};
pub use crate::event::{Event, StepDirection};
pub use crate::pwm::{PwmInfo, PwmTable};
pub use crate::queue::EventQueue;
pub use crate::rt_setup::RtSetup;
pub use crate::scheduler::Scheduler;
pub use crate::{DEFAULT_QUEUE_CAPACITY, DEFAULT_SCHED_PRIORITY, PWM_CHANNEL_COUNT};
