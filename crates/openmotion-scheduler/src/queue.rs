//! Bounded, time-ordered event queue with self-refeeding PWM channels.
//!
//! Producers push from any thread and block while the queue is full; one
//! consumer pops in chronological order and may sleep until each event's
//! scheduled instant. Popping an event whose channel is PWM-configured
//! inserts the next phase event under the same lock, so the pop and the
//! refeed are atomic: observers never see a PWM channel transiently
//! disappear from the queue, and PWM traffic never releases producer
//! backpressure it did not create.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::DEFAULT_QUEUE_CAPACITY;
use crate::event::{Event, StepDirection};
use crate::pwm::{PwmInfo, PwmTable};

#[cfg(target_os = "linux")]
use crate::linux::PlatformSleep;

#[cfg(not(target_os = "linux"))]
use crate::fallback::PlatformSleep;

/// Everything the queue mutex protects.
///
/// The PWM table lives inside the lock because the consumer's refeed check
/// and producer-side `sched_pwm` writes would otherwise race.
struct QueueState {
    heap: BinaryHeap<Reverse<Event>>,
    capacity: usize,
    pwm: PwmTable,
}

/// Bounded min-heap of [`Event`]s shared between producers and one consumer.
///
/// # Threading contract
///
/// [`EventQueue::queue`], [`EventQueue::sched_pwm`] and the query methods
/// may be called from any thread. [`EventQueue::next_event`] must only ever
/// be called from a single consumer thread; the condition variables assume
/// exactly one waiter on `non_empty`.
///
/// # Backpressure
///
/// Producers block while the heap is at capacity and are released only by
/// non-PWM pops. A PWM pop re-inserts the channel's successor event, so the
/// net queue size is unchanged and no capacity is handed out.
pub struct EventQueue {
    state: Mutex<QueueState>,
    non_empty: Condvar,
    consumed: Condvar,
    sleep: PlatformSleep,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create a queue with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a queue bounded at `capacity` events (clamped to at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::with_capacity(capacity),
                capacity,
                pwm: PwmTable::new(),
            }),
            non_empty: Condvar::new(),
            consumed: Condvar::new(),
            sleep: PlatformSleep::new(),
        }
    }

    /// Enqueue `evt`, blocking while the queue is at capacity.
    pub fn queue(&self, evt: Event) {
        let mut state = self.state.lock();
        while state.heap.len() >= state.capacity {
            self.consumed.wait(&mut state);
        }
        self.insert(&mut state, evt);
    }

    /// Pop the earliest event.
    ///
    /// Blocks up to `timeout` while the queue is empty and returns `None` on
    /// timeout. With `do_sleep`, sleeps (outside the lock) until the event's
    /// scheduled instant before returning; otherwise the event is returned
    /// immediately and pacing is the caller's concern.
    ///
    /// Must only be called from one consumer thread.
    pub fn next_event(&self, do_sleep: bool, timeout: Duration) -> Option<Event> {
        let evt = {
            let mut state = self.state.lock();
            while state.heap.is_empty() {
                if self.non_empty.wait_for(&mut state, timeout).timed_out() {
                    return None;
                }
            }
            let Reverse(evt) = state.heap.pop()?;

            let info = state.pwm.get(evt.channel());
            if info.is_active() {
                // Refeed under the same lock: net size unchanged, so no
                // capacity is signalled to producers.
                self.insert(&mut state, Self::pwm_successor(evt, info));
            } else {
                drop(state);
                self.consumed.notify_one();
            }
            evt
        };

        if do_sleep {
            self.sleep_to(evt.time());
        }
        Some(evt)
    }

    /// Configure PWM for `channel`.
    ///
    /// A channel that is already toggling just picks up the new phase times
    /// on its next pop. An idle channel gets a seed event at the current
    /// instant, starting with the forward phase when it has any high time.
    /// Writing [`PwmInfo::OFF`] to an active channel stops the refeed after
    /// the channel's already-queued event fires once.
    pub fn sched_pwm(&self, channel: u8, pwm: PwmInfo) {
        let mut state = self.state.lock();
        debug!(
            channel,
            ns_high = pwm.ns_high,
            ns_low = pwm.ns_low,
            "scheduling pwm"
        );

        let was_active = state.pwm.is_active(channel);
        state.pwm.set(channel, pwm);
        if was_active {
            return;
        }

        let direction = if pwm.ns_high != 0 {
            StepDirection::Forward
        } else {
            StepDirection::Backward
        };
        let seed = Event::new(Instant::now(), channel, direction);
        while state.heap.len() >= state.capacity {
            self.consumed.wait(&mut state);
        }
        self.insert(&mut state, seed);
    }

    /// Reconfigure `channel` to `duty` while keeping its current period.
    pub fn sched_pwm_duty(&self, channel: u8, duty: f32) {
        let period_ns = self.state.lock().pwm.get(channel).period_ns();
        self.sched_pwm(channel, PwmInfo::from_duty_period_ns(duty, period_ns));
    }

    /// The instant at which the last queued event is scheduled, or now when
    /// the queue is empty.
    pub fn last_sched_time(&self) -> Instant {
        let state = self.state.lock();
        state
            .heap
            .iter()
            .map(|Reverse(evt)| evt.time())
            .max()
            .unwrap_or_else(Instant::now)
    }

    /// Adjust the capacity (clamped to at least 1).
    ///
    /// Shrinking below the current length drops nothing; producers simply
    /// stay blocked until the consumer drains below the new bound. Growth
    /// wakes blocked producers.
    pub fn set_buffer_size(&self, capacity: usize) {
        let capacity = capacity.max(1);
        {
            let mut state = self.state.lock();
            state.capacity = capacity;
        }
        info!(capacity, "event queue capacity set");
        self.consumed.notify_all();
    }

    /// Current capacity bound.
    pub fn buffer_size(&self) -> usize {
        self.state.lock().capacity
    }

    /// Number of channels with active PWM configuration.
    pub fn num_active_pwm_channels(&self) -> usize {
        self.state.lock().pwm.count_active()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }

    fn insert(&self, state: &mut QueueState, evt: Event) {
        let was_empty = state.heap.is_empty();
        state.heap.push(Reverse(evt));
        if was_empty {
            self.non_empty.notify_one();
        }
    }

    /// The next phase event for a PWM channel that just fired `evt`.
    fn pwm_successor(evt: Event, info: PwmInfo) -> Event {
        let (phase_ns, other_phase_ns) = match evt.direction() {
            StepDirection::Forward => (info.ns_high, info.ns_low),
            StepDirection::Backward => (info.ns_low, info.ns_high),
        };
        // Zero-length opposite phase folds into a same-direction refresh.
        let direction = if other_phase_ns != 0 {
            evt.direction().reversed()
        } else {
            evt.direction()
        };
        let mut next = Event::new(evt.time(), evt.channel(), direction);
        next.offset_nanos(u64::from(phase_ns));
        next
    }

    fn sleep_to(&self, deadline: Instant) {
        if let Err(err) = self.sleep.sleep_until(deadline) {
            warn!(%err, "absolute sleep failed");
        }
    }
}
