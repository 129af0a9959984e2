//! Event scheduler: a min-heap of timestamped events over a virtual clock.
//!
//! Events are ordered by time and then by insertion sequence, so events
//! scheduled for the same instant fire in the order they were scheduled.
//! Policy decisions that depend on that order (round-robin cursor, queue
//! length ties) stay reproducible for a fixed seed.

use crate::clock::{units_to_ticks, SimClock};
use std::collections::BinaryHeap;

/// A timestamped event for the priority queue.
#[derive(Debug, Clone)]
struct TimedEvent<E> {
    time_ticks: u64,
    sequence: u64,
    event: E,
}

impl<E> PartialEq for TimedEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time_ticks == other.time_ticks && self.sequence == other.sequence
    }
}

impl<E> Eq for TimedEvent<E> {}

impl<E> PartialOrd for TimedEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for TimedEvent<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; we want min-heap
        other
            .time_ticks
            .cmp(&self.time_ticks)
            .then(other.sequence.cmp(&self.sequence))
    }
}

/// Discrete-event scheduler owning the simulation clock.
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    clock: SimClock,
    /// Event queue (min-heap by time, then sequence).
    event_queue: BinaryHeap<TimedEvent<E>>,
    /// Sequence counter for tie-breaking.
    sequence: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            clock: SimClock::new(),
            event_queue: BinaryHeap::new(),
            sequence: 0,
        }
    }

    /// Current time in time units.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Current time in ticks.
    pub fn now_ticks(&self) -> u64 {
        self.clock.now_ticks()
    }

    /// Schedule an event `delay` time units from now.
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative, NaN or infinite.
    pub fn schedule(&mut self, delay: f64, event: E) {
        let ticks = units_to_ticks(delay);
        self.schedule_in_ticks(ticks, event);
    }

    /// Schedule an event `delay_ticks` ticks from now.
    ///
    /// # Panics
    ///
    /// Panics if the target time does not fit in the tick range.
    pub fn schedule_in_ticks(&mut self, delay_ticks: u64, event: E) {
        let now = self.clock.now_ticks();
        let at = match now.checked_add(delay_ticks) {
            Some(at) => at,
            None => panic!(
                "Event time overflows the clock: now={} ticks, delay={} ticks",
                now, delay_ticks
            ),
        };
        self.schedule_at_ticks(at, event);
    }

    /// Schedule an event at an absolute time in time units.
    ///
    /// # Panics
    ///
    /// Panics if `time` lies in the past or is not a valid time.
    pub fn schedule_at(&mut self, time: f64, event: E) {
        self.schedule_at_ticks(units_to_ticks(time), event);
    }

    /// Schedule an event at an absolute tick.
    ///
    /// # Panics
    ///
    /// Panics if `time_ticks` lies in the past.
    pub fn schedule_at_ticks(&mut self, time_ticks: u64, event: E) {
        assert!(
            time_ticks >= self.clock.now_ticks(),
            "Cannot schedule in the past: now={} ticks, target={} ticks",
            self.clock.now_ticks(),
            time_ticks,
        );
        self.event_queue.push(TimedEvent {
            time_ticks,
            sequence: self.sequence,
            event,
        });
        self.sequence += 1;
    }

    /// Pop the earliest event at or before `horizon_ticks`, advancing the
    /// clock to its time. Later events stay queued and are never touched.
    pub fn pop_until(&mut self, horizon_ticks: u64) -> Option<E> {
        match self.event_queue.peek() {
            Some(next) if next.time_ticks <= horizon_ticks => {}
            _ => return None,
        }
        let timed = self.event_queue.pop()?;
        self.clock.advance_to_ticks(timed.time_ticks);
        Some(timed.event)
    }

    /// Tick of the earliest pending event.
    pub fn next_event_ticks(&self) -> Option<u64> {
        self.event_queue.peek().map(|e| e.time_ticks)
    }

    /// Get the number of pending events.
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }

    /// Total events ever scheduled.
    pub fn events_scheduled(&self) -> u64 {
        self.sequence
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
