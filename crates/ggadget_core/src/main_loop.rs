//! Main loop boundary
//!
//! Views never own a clock or a timer thread. A [`MainLoop`] handle is passed
//! in at construction; the view registers a timeout watch per timer token and
//! the host calls back into the view when a watch is due.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::events::TimerToken;

/// Host event loop services used by the timer scheduler
pub trait MainLoop {
    /// Monotonic time in milliseconds
    fn current_time(&self) -> u64;

    /// Fire `token` every `interval_ms` until it is removed
    fn add_timeout_watch(&self, interval_ms: u64, token: TimerToken);

    /// Stop firing `token`; unknown tokens are ignored
    fn remove_watch(&self, token: TimerToken);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Watch {
    interval: u64,
    next_fire: u64,
}

/// Deterministic main loop with a manually advanced clock
///
/// Drivers call [`ManualMainLoop::next_due`] to find the next watch that is
/// due at or before a deadline, advance the clock to its fire time, deliver
/// it, and then [`ManualMainLoop::reschedule`] it if the receiver wants more.
#[derive(Debug, Default)]
pub struct ManualMainLoop {
    now: Cell<u64>,
    watches: RefCell<BTreeMap<TimerToken, Watch>>,
}

impl ManualMainLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: u64) -> Self {
        let main_loop = Self::default();
        main_loop.now.set(now);
        main_loop
    }

    pub fn set_time(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn has_watch(&self, token: TimerToken) -> bool {
        self.watches.borrow().contains_key(&token)
    }

    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    /// Interval registered for `token`
    pub fn watch_interval(&self, token: TimerToken) -> Option<u64> {
        self.watches.borrow().get(&token).map(|w| w.interval)
    }

    /// Earliest watch due at or before `deadline`, with its fire time
    ///
    /// Ties resolve to the lowest token, which is also the oldest timer.
    pub fn next_due(&self, deadline: u64) -> Option<(TimerToken, u64)> {
        self.watches
            .borrow()
            .iter()
            .filter(|(_, w)| w.next_fire <= deadline)
            .min_by_key(|(token, w)| (w.next_fire, **token))
            .map(|(token, w)| (*token, w.next_fire))
    }

    /// Schedule the next firing of a watch one interval after now
    pub fn reschedule(&self, token: TimerToken) {
        let now = self.now.get();
        if let Some(watch) = self.watches.borrow_mut().get_mut(&token) {
            watch.next_fire = now + watch.interval.max(1);
        }
    }
}

impl MainLoop for ManualMainLoop {
    fn current_time(&self) -> u64 {
        self.now.get()
    }

    fn add_timeout_watch(&self, interval_ms: u64, token: TimerToken) {
        let watch = Watch {
            interval: interval_ms,
            next_fire: self.now.get() + interval_ms,
        };
        self.watches.borrow_mut().insert(token, watch);
    }

    fn remove_watch(&self, token: TimerToken) {
        self.watches.borrow_mut().remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_due_orders_by_fire_time() {
        let main_loop = ManualMainLoop::starting_at(100);
        main_loop.add_timeout_watch(50, TimerToken(1));
        main_loop.add_timeout_watch(20, TimerToken(2));

        assert_eq!(main_loop.next_due(110), None);
        assert_eq!(main_loop.next_due(200), Some((TimerToken(2), 120)));

        main_loop.set_time(120);
        main_loop.reschedule(TimerToken(2));
        assert_eq!(main_loop.next_due(200), Some((TimerToken(2), 140)));
        assert_eq!(main_loop.next_due(139), None);
    }

    #[test]
    fn test_remove_watch() {
        let main_loop = ManualMainLoop::new();
        main_loop.add_timeout_watch(0, TimerToken(5));
        assert!(main_loop.has_watch(TimerToken(5)));
        assert_eq!(main_loop.next_due(0), Some((TimerToken(5), 0)));
        main_loop.remove_watch(TimerToken(5));
        main_loop.remove_watch(TimerToken(5));
        assert_eq!(main_loop.watch_count(), 0);
    }
}
