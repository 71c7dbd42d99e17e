//! Bounded, time-ordered event scheduling for stepper-like output channels.
//!
//! This crate is the timing core of a motion controller: producer threads
//! enqueue timestamped [`Event`]s, a single consumer thread pops them in
//! chronological order, sleeps until each scheduled instant on the monotonic
//! clock, and hands them to the actuation layer. Channels configured for PWM
//! refeed themselves: popping one phase event atomically schedules the next,
//! so a channel toggles forever from a single seed.
//!
//! It includes:
//!
//! - **[`EventQueue`]**: bounded min-heap with producer backpressure and
//!   in-lock PWM refeed
//! - **[`Scheduler`]**: facade owning the actuation interface, with the
//!   cooperative [`Scheduler::event_loop`] pump
//! - **[`RtSetup`]**: realtime thread configuration (`SCHED_FIFO`, memory
//!   locking), degrading gracefully where unavailable
//! - **Platform sleep**: absolute monotonic-clock sleep with a busy-spin tail
//!   on Linux, a portable fallback elsewhere
//!
//! # Threading contract
//!
//! [`EventQueue::queue`] and the PWM operations may be called from any
//! thread. [`EventQueue::next_event`] (and therefore
//! [`Scheduler::event_loop`]) must only ever run on one consumer thread.
//!
//! # Example
//!
//! ```no_run
//! use std::time::{Duration, Instant};
//! use openmotion_scheduler::{Event, RtSetup, Scheduler, StepDirection};
//!
//! let scheduler = Scheduler::new(());
//! scheduler.init_sched_thread(&RtSetup::default());
//!
//! scheduler.queue(Event::new(Instant::now(), 3, StepDirection::Forward));
//! while let Some(_evt) = scheduler.next_event(true, Duration::from_millis(100)) {
//!     // drive the output channel here
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

use std::time::Duration;

pub mod error;
pub mod event;
pub mod pwm;
pub mod queue;
pub mod rt_setup;
pub mod scheduler;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod fallback;

pub mod prelude;

pub use error::{SchedError, SchedResult};
pub use event::{Event, StepDirection};
pub use pwm::{PwmInfo, PwmTable};
pub use queue::EventQueue;
pub use rt_setup::RtSetup;
pub use scheduler::Scheduler;

/// Realtime FIFO priority requested for the consumer thread by default.
pub const DEFAULT_SCHED_PRIORITY: i32 = 30;

/// Initial capacity of the event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 512;

/// Number of addressable output channels.
pub const PWM_CHANNEL_COUNT: usize = 256;

/// How long the event loop yields to the OS per poll when the client has no
/// imminent work.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
