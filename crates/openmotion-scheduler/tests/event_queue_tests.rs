//! Cross-thread behavior of the bounded event queue.
//!
//! Focus areas:
//! - Timeout on an empty queue (null result, elapsed lower bound)
//! - Chronological delivery regardless of enqueue order
//! - Producer backpressure at capacity, released by a consumer pop
//! - Event conservation across a producer/consumer handoff
//! - Capacity adjustments while producers are blocked

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use openmotion_scheduler::{Event, EventQueue, StepDirection};

const FOREVER: Duration = Duration::from_secs(5);

fn evt_at(base: Instant, offset: Duration, channel: u8) -> Event {
    Event::new(base + offset, channel, StepDirection::Forward)
}

#[test]
fn empty_queue_timeout_returns_none_after_deadline() {
    let queue = EventQueue::new();
    let start = Instant::now();

    let popped = queue.next_event(true, Duration::from_millis(10));

    assert_eq!(popped, None);
    assert!(start.elapsed() >= Duration::from_millis(10));
}

#[test]
fn events_pop_in_chronological_order() {
    let queue = EventQueue::new();
    let base = Instant::now() + Duration::from_millis(50);

    queue.queue(evt_at(base, Duration::ZERO, 0));
    queue.queue(evt_at(base, Duration::from_millis(5), 1));
    queue.queue(evt_at(base, Duration::from_millis(2), 2));

    let order: Vec<u8> = (0..3)
        .map(|_| {
            queue
                .next_event(false, FOREVER)
                .expect("queued event")
                .channel()
        })
        .collect();

    assert_eq!(order, vec![0, 2, 1]);
}

#[test]
fn full_queue_blocks_producer_until_pop() {
    let queue = Arc::new(EventQueue::with_capacity(4));
    let base = Instant::now() + Duration::from_secs(1);

    for channel in 0..4u8 {
        queue.queue(evt_at(base, Duration::from_millis(u64::from(channel)), channel));
    }

    let produced = Arc::new(AtomicBool::new(false));
    let producer = {
        let queue = Arc::clone(&queue);
        let produced = Arc::clone(&produced);
        thread::spawn(move || {
            queue.queue(evt_at(base, Duration::from_millis(10), 9));
            produced.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(
        !produced.load(Ordering::SeqCst),
        "fifth enqueue must block at capacity 4"
    );

    let earliest = queue.next_event(false, FOREVER).expect("earliest event");
    assert_eq!(earliest.channel(), 0);

    producer.join().expect("producer thread");
    assert!(produced.load(Ordering::SeqCst));
    assert_eq!(queue.len(), 4);
}

#[test]
fn growing_capacity_releases_blocked_producer() {
    let queue = Arc::new(EventQueue::with_capacity(1));
    let base = Instant::now() + Duration::from_secs(1);
    queue.queue(evt_at(base, Duration::ZERO, 0));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.queue(evt_at(base, Duration::from_millis(1), 1)))
    };

    thread::sleep(Duration::from_millis(20));
    queue.set_buffer_size(2);

    producer.join().expect("producer thread");
    assert_eq!(queue.len(), 2);
}

#[test]
fn producer_consumer_handoff_conserves_events() {
    const TOTAL: usize = 500;

    let queue = Arc::new(EventQueue::with_capacity(16));
    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let base = Instant::now();
            for i in 0..TOTAL {
                // Past timestamps: delivered as soon as reached.
                queue.queue(Event::new(
                    base + Duration::from_nanos(i as u64),
                    (i % 256) as u8,
                    if i % 2 == 0 {
                        StepDirection::Forward
                    } else {
                        StepDirection::Backward
                    },
                ));
            }
        })
    };

    let mut received = 0;
    let mut last_time = None;
    while received < TOTAL {
        let evt = queue.next_event(false, FOREVER).expect("producer feeds");
        if let Some(prev) = last_time {
            // A single producer enqueues in increasing time order, so the
            // heap must hand events back non-decreasing.
            assert!(evt.time() >= prev);
        }
        last_time = Some(evt.time());
        received += 1;
    }

    producer.join().expect("producer thread");
    assert_eq!(received, TOTAL);
    assert!(queue.is_empty());
}

#[test]
fn shrinking_capacity_keeps_queued_events() {
    let queue = EventQueue::with_capacity(8);
    let base = Instant::now() + Duration::from_secs(1);
    for channel in 0..4u8 {
        queue.queue(evt_at(base, Duration::from_millis(u64::from(channel)), channel));
    }

    queue.set_buffer_size(2);

    assert_eq!(queue.buffer_size(), 2);
    assert_eq!(queue.len(), 4, "shrinking must not drop events");
}
