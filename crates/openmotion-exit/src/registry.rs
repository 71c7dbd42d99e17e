//! Leveled exit-handler registry and process-global arming.
//!
//! The registry itself is a plain instance type so it can be unit tested;
//! process-wide behavior goes through the lazily-initialized global at the
//! bottom of this module.

use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::DEFAULT_EXIT_LEVELS;
use crate::error::{ExitError, ExitResult};

/// Handler invoked during staged process exit.
pub type ExitHandler = Box<dyn Fn() + Send + 'static>;

/// A fixed number of ordered handler buckets, run level-by-level on exit.
///
/// Lower levels run first. Within a level, handlers run in registration
/// order. The sweep runs at most once per registry; concurrent callers of
/// [`ExitRegistry::run`] race on an atomic flag and every loser returns
/// without touching the handlers.
pub struct ExitRegistry {
    handlers: Mutex<Vec<Vec<ExitHandler>>>,
    is_exiting: AtomicBool,
    completed: AtomicBool,
}

impl std::fmt::Debug for ExitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitRegistry")
            .field("levels", &self.handlers.lock().len())
            .field("is_exiting", &self.is_exiting.load(Ordering::Acquire))
            .finish()
    }
}

impl Default for ExitRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_EXIT_LEVELS)
    }
}

impl ExitRegistry {
    /// Create a registry with `levels` empty handler buckets.
    pub fn new(levels: usize) -> Self {
        let mut handlers = Vec::with_capacity(levels);
        handlers.resize_with(levels, Vec::new);
        Self {
            handlers: Mutex::new(handlers),
            is_exiting: AtomicBool::new(false),
            completed: AtomicBool::new(false),
        }
    }

    /// Number of levels this registry was created with.
    pub fn levels(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Append `handler` to `level`.
    ///
    /// # Errors
    ///
    /// [`ExitError::InvalidLevel`] when `level` is outside the configured
    /// range, [`ExitError::AlreadyExiting`] when the sweep has already begun.
    pub fn register<F>(&self, level: usize, handler: F) -> ExitResult
    where
        F: Fn() + Send + 'static,
    {
        if self.is_exiting() {
            return Err(ExitError::AlreadyExiting);
        }
        let mut handlers = self.handlers.lock();
        let levels = handlers.len();
        let bucket = handlers
            .get_mut(level)
            .ok_or(ExitError::InvalidLevel { level, levels })?;
        bucket.push(Box::new(handler));
        Ok(())
    }

    /// Run every registered handler, level-by-level from 0 upward.
    ///
    /// Only the first caller performs the sweep; handlers registered after
    /// the sweep has started are not run. A panicking handler is caught and
    /// logged so the remaining handlers still execute.
    pub fn run(&self) {
        if self
            .is_exiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let levels = std::mem::take(&mut *self.handlers.lock());
        for (level, bucket) in levels.into_iter().enumerate() {
            debug!(level, count = bucket.len(), "running exit handlers");
            for handler in bucket {
                if panic::catch_unwind(AssertUnwindSafe(&handler)).is_err() {
                    warn!(level, "exit handler panicked, continuing shutdown");
                }
            }
        }
        self.completed.store(true, Ordering::Release);
    }

    /// Whether an exit sweep has been requested (possibly still running).
    pub fn is_exiting(&self) -> bool {
        self.is_exiting.load(Ordering::Acquire)
    }

    /// Whether the sweep has finished.
    pub fn has_run(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

static GLOBAL: OnceLock<ExitRegistry> = OnceLock::new();
static CONFIGURED: AtomicBool = AtomicBool::new(false);

fn global() -> &'static ExitRegistry {
    GLOBAL.get_or_init(ExitRegistry::default)
}

/// Register `handler` at `level` in the process-global registry.
///
/// # Errors
///
/// See [`ExitRegistry::register`].
pub fn register_exit_handler<F>(level: usize, handler: F) -> ExitResult
where
    F: Fn() + Send + 'static,
{
    global().register(level, handler)
}

/// Run the process-global handler sweep. Safe to call from any thread,
/// any number of times; only the first call does work.
pub fn call_exit_handlers() {
    global().run();
}

/// Whether process exit has been requested through the global registry.
pub fn is_exiting() -> bool {
    global().is_exiting()
}

/// Arm the process so the global sweep runs on normal termination, on
/// SIGINT/SIGTERM, and on panic. Idempotent.
pub fn configure_exit_handlers() {
    if CONFIGURED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return;
    }

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        call_exit_handlers();
        previous(info);
    }));

    #[cfg(unix)]
    // SAFETY: trampolines are extern "C" fns with matching signatures; the
    // sigaction struct is fully initialized before the syscall.
    unsafe {
        arm_process_hooks();
    }
}

#[cfg(unix)]
unsafe fn arm_process_hooks() {
    unsafe {
        if libc::atexit(atexit_trampoline) != 0 {
            warn!("atexit registration failed, normal-exit handlers not armed");
        }

        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = signal_trampoline as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        for signal in [libc::SIGINT, libc::SIGTERM] {
            if libc::sigaction(signal, &action, std::ptr::null_mut()) != 0 {
                warn!(signal, "sigaction failed, signal exit handlers not armed");
            }
        }
    }
}

#[cfg(unix)]
extern "C" fn atexit_trampoline() {
    call_exit_handlers();
}

#[cfg(unix)]
extern "C" fn signal_trampoline(signal: libc::c_int) {
    call_exit_handlers();
    // Conventional shell-visible exit status for death-by-signal.
    unsafe { libc::_exit(128 + signal) };
}
