//! Scheduler facade tying the event queue to an owned actuation interface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::DEFAULT_POLL_TIMEOUT;
use crate::event::Event;
use crate::pwm::PwmInfo;
use crate::queue::EventQueue;
use crate::rt_setup::RtSetup;

#[cfg(target_os = "linux")]
use crate::linux::PlatformSleep;

#[cfg(not(target_os = "linux"))]
use crate::fallback::PlatformSleep;

/// Owns the actuation interface and drives the event queue.
///
/// The scheduler never invokes the interface itself; it holds it for
/// ownership and lifetime, and event consumers reach it through
/// [`Scheduler::interface`] from their `on_event` callback.
///
/// `queue` and the PWM operations may be called from any thread (wrap the
/// scheduler in an `Arc` to share it); [`Scheduler::next_event`] and
/// [`Scheduler::event_loop`] must stay on a single consumer thread.
pub struct Scheduler<I> {
    interface: I,
    queue: EventQueue,
    sleep: PlatformSleep,
    stopped: AtomicBool,
}

impl<I> Scheduler<I> {
    /// Create a scheduler owning `interface`, with the default queue
    /// capacity.
    pub fn new(interface: I) -> Self {
        Self::with_capacity(interface, crate::DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a scheduler with an explicit queue capacity.
    pub fn with_capacity(interface: I, capacity: usize) -> Self {
        Self {
            interface,
            queue: EventQueue::with_capacity(capacity),
            sleep: PlatformSleep::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// The owned actuation interface.
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Mutable access to the owned actuation interface.
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Tear down the scheduler and hand the interface back.
    pub fn into_interface(self) -> I {
        self.interface
    }

    /// Enqueue `evt`, blocking while the queue is full.
    pub fn queue(&self, evt: Event) {
        self.queue.queue(evt);
    }

    /// Pop the earliest event; see [`EventQueue::next_event`].
    pub fn next_event(&self, do_sleep: bool, timeout: Duration) -> Option<Event> {
        self.queue.next_event(do_sleep, timeout)
    }

    /// Configure PWM for `channel`; see [`EventQueue::sched_pwm`].
    pub fn sched_pwm(&self, channel: u8, pwm: PwmInfo) {
        self.queue.sched_pwm(channel, pwm);
    }

    /// Reconfigure `channel`'s duty cycle, keeping its period.
    pub fn sched_pwm_duty(&self, channel: u8, duty: f32) {
        self.queue.sched_pwm_duty(channel, duty);
    }

    /// The instant of the latest queued event, or now when empty.
    pub fn last_sched_time(&self) -> Instant {
        self.queue.last_sched_time()
    }

    /// Adjust the queue capacity.
    pub fn set_buffer_size(&self, capacity: usize) {
        self.queue.set_buffer_size(capacity);
    }

    /// Current queue capacity.
    pub fn buffer_size(&self) -> usize {
        self.queue.buffer_size()
    }

    /// Number of channels with active PWM configuration.
    pub fn num_active_pwm_channels(&self) -> usize {
        self.queue.num_active_pwm_channels()
    }

    /// Raise the calling thread to the realtime class described by `setup`.
    ///
    /// Call this from the consumer thread before entering
    /// [`Scheduler::event_loop`]. Denial (containers, missing privileges,
    /// non-realtime hosts) is logged and execution continues at default
    /// priority.
    pub fn init_sched_thread(&self, setup: &RtSetup) {
        match self.sleep.apply_rt_setup(setup) {
            Ok(()) => {
                if setup.has_rt_features() {
                    info!(priority = setup.priority, "consumer thread realtime setup applied");
                }
            }
            Err(err) => {
                warn!(
                    priority = setup.priority,
                    %err,
                    "realtime setup denied, continuing at default priority"
                );
            }
        }
    }

    /// Sleep on the monotonic clock until `evt` is due. Returns immediately
    /// when the instant has already passed; a signal may end the sleep
    /// early, in which case the caller re-checks the clock.
    pub fn sleep_until_event(&self, evt: &Event) {
        if let Err(err) = self.sleep.sleep_until(evt.time()) {
            warn!(%err, "absolute sleep failed");
        }
    }

    /// Ask a running [`Scheduler::event_loop`] to wind down. The loop
    /// notices at its next poll (within [`DEFAULT_POLL_TIMEOUT`]).
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether the event loop should wind down, either because
    /// [`Scheduler::request_stop`] was called or because process exit has
    /// begun.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire) || openmotion_exit::is_exiting()
    }

    /// Cooperative consumer pump.
    ///
    /// Each turn asks the client whether it has imminent work (`on_wait`).
    /// If it does, the queue is polled without yielding; otherwise the poll
    /// may relinquish the CPU for up to [`DEFAULT_POLL_TIMEOUT`]. A popped
    /// event is held until due, yielding via [`Scheduler::sleep_until_event`]
    /// whenever the client has nothing imminent, and is then handed to
    /// `on_event` no earlier than its scheduled instant.
    ///
    /// Runs until [`Scheduler::request_stop`] or process exit.
    pub fn event_loop<E, W>(&self, mut on_event: E, mut on_wait: W)
    where
        E: FnMut(Event),
        W: FnMut() -> bool,
    {
        while !self.is_stopped() {
            let need_cpu = on_wait();
            let timeout = if need_cpu {
                Duration::ZERO
            } else {
                DEFAULT_POLL_TIMEOUT
            };

            let Some(evt) = self.queue.next_event(false, timeout) else {
                continue;
            };

            while !evt.is_due(Instant::now()) {
                if self.is_stopped() {
                    return;
                }
                if !on_wait() {
                    self.sleep_until_event(&evt);
                }
            }
            on_event(evt);
        }
    }
}
