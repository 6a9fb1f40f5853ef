//! Deterministic timer queue
//!
//! Timers are plain entries keyed by deadline. Nothing sleeps here: the
//! session loop sleeps until [`TimerQueue::next_deadline`] and tests hand in
//! synthetic instants.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Handle for cancelling a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct TimerQueue<T> {
    /// Ordered by deadline, ties broken by scheduling order
    entries: BTreeMap<(Instant, TimerId), T>,
    deadlines: HashMap<TimerId, Instant>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, at: Instant, event: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((at, id), event);
        self.deadlines.insert(id, at);
        id
    }

    /// Returns the event if the timer had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let at = self.deadlines.remove(&id)?;
        self.entries.remove(&(at, id))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, T)> {
        let (at, id) = *self.entries.keys().next()?;
        if at > now {
            return None;
        }
        self.deadlines.remove(&id);
        self.entries.remove(&(at, id)).map(|event| (id, event))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_in_deadline_order() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(start + Duration::from_millis(200), "late");
        timers.schedule(start + Duration::from_millis(100), "early");

        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(100)));
        assert!(timers.pop_due(start).is_none());

        let now = start + Duration::from_millis(250);
        assert_eq!(timers.pop_due(now).map(|(_, e)| e), Some("early"));
        assert_eq!(timers.pop_due(now).map(|(_, e)| e), Some("late"));
        assert!(timers.pop_due(now).is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_equal_deadlines_fire_in_scheduling_order() {
        let at = Instant::now() + Duration::from_secs(4);
        let mut timers = TimerQueue::new();
        timers.schedule(at, 1);
        timers.schedule(at, 2);
        timers.schedule(at, 3);

        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(at).map(|(_, e)| e)).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        let a = timers.schedule(start, "a");
        timers.schedule(start, "b");

        assert_eq!(timers.cancel(a), Some("a"));
        assert_eq!(timers.cancel(a), None);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(start).map(|(_, e)| e), Some("b"));
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let start = Instant::now();
        let mut timers = TimerQueue::new();
        let id = timers.schedule(start, ());
        assert!(timers.pop_due(start).is_some());
        assert!(timers.cancel(id).is_none());
    }
}
