//! Error types for the exit-handler registry.

use thiserror::Error;

/// Errors that can occur while registering exit handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExitError {
    /// Requested level is outside the registry's configured range.
    #[error("exit level {level} out of range (registry has {levels} levels)")]
    InvalidLevel {
        /// The level that was requested.
        level: usize,
        /// The number of levels the registry was created with.
        levels: usize,
    },

    /// Registration arrived after exit had already begun.
    #[error("exit already in progress, handler not registered")]
    AlreadyExiting,
}

/// Result alias for exit-registry operations.
pub type ExitResult<T = ()> = Result<T, ExitError>;
