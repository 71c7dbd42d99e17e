//! # openmotion-exit
//!
//! Staged exit-handler registry for the OpenMotion motion-control core.
//!
//! Motion hardware must be released in a fixed order when the process dies:
//! outputs first (de-energize steppers, reset GPIO lines), then memory-backed
//! resources. This crate provides a leveled registry of handlers that runs
//! exactly once per process, regardless of whether termination comes from a
//! normal return, a fatal signal, or a panic.
//!
//! ## Guarantees
//!
//! - **Single execution**: an atomic compare-and-set ensures the handler
//!   sweep runs at most once, even when several threads request exit
//!   concurrently.
//! - **Level ordering**: level 0 runs before level 1; within a level,
//!   handlers run in registration order.
//! - **Panic containment**: a panicking handler is caught and logged; the
//!   remaining handlers still run.
//!
//! ## Example
//!
//! ```
//! use openmotion_exit::{ExitRegistry, IO_EXIT_LEVEL, MEM_EXIT_LEVEL};
//!
//! let registry = ExitRegistry::default();
//! registry.register(IO_EXIT_LEVEL, || { /* park the steppers */ }).unwrap();
//! registry.register(MEM_EXIT_LEVEL, || { /* flush buffers */ }).unwrap();
//! registry.run();
//! assert!(registry.has_run());
//! ```
//!
//! Process-wide integration goes through [`configure_exit_handlers`], which
//! arms SIGINT/SIGTERM, normal termination, and the panic hook to funnel into
//! [`call_exit_handlers`].

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    static_mut_refs,
    unused_must_use,
    missing_docs,
    missing_debug_implementations
)]

pub mod error;
pub mod registry;

pub mod prelude;

pub use error::{ExitError, ExitResult};
pub use registry::{
    ExitRegistry, call_exit_handlers, configure_exit_handlers, is_exiting, register_exit_handler,
};

/// Number of exit levels in the process-global registry.
pub const DEFAULT_EXIT_LEVELS: usize = 2;

/// Exit level reserved for handlers that release I/O (reset GPIO state,
/// de-energize outputs). Runs first.
pub const IO_EXIT_LEVEL: usize = 0;

/// Exit level reserved for handlers that release memory-backed resources.
/// Runs after [`IO_EXIT_LEVEL`].
pub const MEM_EXIT_LEVEL: usize = 1;
