//! Prelude module for common exit-registry types.

pub use crate::error::{ExitError, ExitResult};
pub use crate::registry::{
    ExitRegistry, call_exit_handlers, configure_exit_handlers, is_exiting, register_exit_handler,
};
pub use crate::{DEFAULT_EXIT_LEVELS, IO_EXIT_LEVEL, MEM_EXIT_LEVEL};
