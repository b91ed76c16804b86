//! Timers and animations
//!
//! Every timer is a watch on the host main loop keyed by its [`TimerToken`].
//! The host calls [`View::on_timer`] when a watch fires; the view looks the
//! token up on every tick, so a timer removed by a nested call simply stops.
//!
//! Animations run on a fixed tick independent of their duration and report
//! an interpolated integer value. A zero-delay helper timer reports the start
//! value right away.

use std::rc::Rc;

use ggadget_core::{GadgetError, Result, TimerEvent, TimerToken};
use tracing::{debug, trace, warn};

use crate::event::ScriptableEvent;
use crate::view::View;

/// Timer callback; the tick is also visible through [`View::event`]
pub type TimerCallback = Rc<dyn Fn(&mut View, &TimerEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    Timeout,
    Interval,
    Animation,
    /// Fires the start value of an animation immediately, then goes away
    AnimationFirst,
}

pub(crate) struct TimerEntry {
    kind: TimerKind,
    start_time: u64,
    start_value: i32,
    end_value: i32,
    last_value: i32,
    duration: u64,
    /// Clock reading when the previous firing returned
    last_finished: Option<u64>,
    callback: TimerCallback,
    /// Animation served by an `AnimationFirst` helper
    target: Option<TimerToken>,
}

impl TimerEntry {
    fn new(kind: TimerKind, start_time: u64, duration: u64, callback: TimerCallback) -> Self {
        Self {
            kind,
            start_time,
            start_value: 0,
            end_value: 0,
            last_value: 0,
            duration,
            last_finished: None,
            callback,
            target: None,
        }
    }

    /// Interpolated value at `now` and whether the animation is complete
    fn animation_value(&self, now: u64) -> (i32, bool) {
        let progress = if self.duration == 0 {
            1.0
        } else {
            (now.saturating_sub(self.start_time) as f64 / self.duration as f64).clamp(0.0, 1.0)
        };
        let span = f64::from(self.end_value) - f64::from(self.start_value);
        let value = (f64::from(self.start_value) + progress * span).round() as i32;
        (value, progress >= 1.0)
    }
}

impl View {
    /// Call `callback` once after `delay_ms`
    pub fn set_timeout(&mut self, callback: TimerCallback, delay_ms: u64) -> Result<TimerToken> {
        self.add_timer(TimerKind::Timeout, delay_ms, callback)
    }

    pub fn clear_timeout(&mut self, token: TimerToken) {
        let _ = self.remove_timer(token);
    }

    /// Call `callback` every `interval_ms` until cleared
    pub fn set_interval(&mut self, callback: TimerCallback, interval_ms: u64) -> Result<TimerToken> {
        self.add_timer(TimerKind::Interval, interval_ms, callback)
    }

    pub fn clear_interval(&mut self, token: TimerToken) {
        let _ = self.remove_timer(token);
    }

    /// Animate from `start` to `end` over `duration_ms`
    ///
    /// `callback` receives each distinct interpolated value, starting with
    /// `start` right away and ending with `end` once the duration elapsed.
    pub fn begin_animation(
        &mut self,
        callback: TimerCallback,
        start: i32,
        end: i32,
        duration_ms: u64,
    ) -> Result<TimerToken> {
        let interval = self.config().animation_interval_ms;
        let token = self.add_timer(TimerKind::Animation, interval, Rc::clone(&callback))?;
        if let Some(entry) = self.timers.get_mut(&token) {
            entry.duration = duration_ms;
            entry.start_value = start;
            entry.end_value = end;
            entry.last_value = start;
        }
        let first = self.add_timer(TimerKind::AnimationFirst, 0, callback)?;
        if let Some(entry) = self.timers.get_mut(&first) {
            entry.target = Some(token);
        }
        Ok(token)
    }

    pub fn cancel_animation(&mut self, token: TimerToken) {
        let _ = self.remove_timer(token);
    }

    /// Remove a timer of any kind and its host watch
    pub fn remove_timer(&mut self, token: TimerToken) -> Result<()> {
        if self.timers.remove(&token).is_none() {
            warn!("Removing unknown timer {}", token);
            return Err(GadgetError::TimerNotFound(token.0));
        }
        debug!("Removed timer {}", token);
        self.main_loop().remove_watch(token);
        Ok(())
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn timer_kind(&self, token: TimerToken) -> Option<TimerKind> {
        self.timers.get(&token).map(|entry| entry.kind)
    }

    /// Handle a fired host watch
    ///
    /// Returns whether the watch should keep firing.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        let now = self.main_loop().current_time();
        let Some(entry) = self.timers.get(&token) else {
            debug!("Timer {} fired after removal", token);
            return false;
        };
        let kind = entry.kind;
        trace!("Timer {} ({:?}) at {}", token, kind, now);

        match kind {
            TimerKind::Timeout => {
                let Some(entry) = self.timers.remove(&token) else {
                    return false;
                };
                self.run_timer_callback(&entry.callback, TimerEvent { token, value: 0 });
                false
            }
            TimerKind::Interval => {
                if self.is_throttled(entry, now) {
                    return true;
                }
                let callback = Rc::clone(&entry.callback);
                self.run_timer_callback(&callback, TimerEvent { token, value: 0 });
                self.finish_firing(token)
            }
            TimerKind::Animation => {
                if self.is_throttled(entry, now) {
                    return true;
                }
                let (value, complete) = entry.animation_value(now);
                if complete {
                    let Some(entry) = self.timers.remove(&token) else {
                        return false;
                    };
                    debug!("Animation {} complete", token);
                    self.run_timer_callback(&entry.callback, TimerEvent { token, value });
                    return false;
                }
                if value == entry.last_value {
                    return true;
                }
                let callback = Rc::clone(&entry.callback);
                if let Some(entry) = self.timers.get_mut(&token) {
                    entry.last_value = value;
                }
                self.run_timer_callback(&callback, TimerEvent { token, value });
                self.finish_firing(token)
            }
            TimerKind::AnimationFirst => {
                let target = entry.target;
                self.timers.remove(&token);
                let Some(target) = target else {
                    return false;
                };
                let Some(animation) = self.timers.get(&target) else {
                    return false;
                };
                let callback = Rc::clone(&animation.callback);
                let value = animation.start_value;
                self.run_timer_callback(&callback, TimerEvent { token: target, value });
                false
            }
        }
    }

    fn add_timer(
        &mut self,
        kind: TimerKind,
        interval_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimerToken> {
        self.ensure_alive()?;
        let token = self.allocate_timer_token();
        let now = self.main_loop().current_time();
        self.timers
            .insert(token, TimerEntry::new(kind, now, interval_ms, callback));
        self.main_loop().add_timeout_watch(interval_ms, token);
        debug!("Added {:?} timer {} ({}ms)", kind, token, interval_ms);
        Ok(token)
    }

    /// Next free non-zero token
    fn allocate_timer_token(&mut self) -> TimerToken {
        loop {
            let candidate = TimerToken(self.next_timer_token);
            self.next_timer_token = self.next_timer_token.wrapping_add(1).max(1);
            if !self.timers.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Whether the previous firing finished too recently
    fn is_throttled(&self, entry: &TimerEntry, now: u64) -> bool {
        let guard = self.config().min_timer_interval_ms;
        match entry.last_finished {
            Some(last) if now.saturating_sub(last) < guard => {
                debug!("Dropping firing of {:?} timer; previous ended at {}", entry.kind, last);
                true
            }
            _ => false,
        }
    }

    /// Record the end of a firing; false if the callback removed the timer
    fn finish_firing(&mut self, token: TimerToken) -> bool {
        let now = self.main_loop().current_time();
        match self.timers.get_mut(&token) {
            Some(entry) => {
                entry.last_finished = Some(now);
                true
            }
            None => false,
        }
    }

    fn run_timer_callback(&mut self, callback: &TimerCallback, event: TimerEvent) {
        let depth = self.event_stack.len();
        self.event_stack.push(ScriptableEvent::new(event, None));
        callback(self, &event);
        self.event_stack.truncate(depth);
    }

    /// Drop every timer and its host watch
    pub(crate) fn cancel_all_timers(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        debug!("Cancelling {} timers", self.timers.len());
        let main_loop = Rc::clone(self.main_loop());
        for token in self.timers.drain().map(|(token, _)| token) {
            main_loop.remove_watch(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use ggadget_core::MainLoop;

    use super::*;
    use crate::testing::{init_test_tracing, run_timers, test_view};

    fn recorder() -> (Rc<RefCell<Vec<i32>>>, TimerCallback) {
        let values = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&values);
        let callback: TimerCallback = Rc::new(move |_, event| sink.borrow_mut().push(event.value));
        (values, callback)
    }

    #[test]
    fn test_timeout_fires_once() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        let token = view.set_timeout(callback, 30).unwrap();
        assert_eq!(view.timer_kind(token), Some(TimerKind::Timeout));

        assert_eq!(run_timers(&mut view, &main_loop, 29), 0);
        run_timers(&mut view, &main_loop, 500);
        assert_eq!(values.borrow().len(), 1);
        assert_eq!(view.timer_count(), 0);
        assert_eq!(main_loop.watch_count(), 0);
    }

    #[test]
    fn test_tokens_are_unique_and_non_zero() {
        let (mut view, _, _) = test_view();
        let a = view.set_timeout(Rc::new(|_, _| {}), 10).unwrap();
        let b = view.set_interval(Rc::new(|_, _| {}), 10).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.0, 0);
        assert_ne!(b.0, 0);
    }

    #[test]
    fn test_interval_repeats_until_cleared() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        let token = view.set_interval(callback, 10).unwrap();

        run_timers(&mut view, &main_loop, 45);
        assert_eq!(values.borrow().len(), 4);

        view.clear_interval(token);
        run_timers(&mut view, &main_loop, 100);
        assert_eq!(values.borrow().len(), 4);
        assert!(!main_loop.has_watch(token));
    }

    #[test]
    fn test_interval_firings_too_close_are_dropped() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        view.set_interval(callback, 3).unwrap();

        // Fires at 3, drops 6, fires at 9, drops 12
        assert_eq!(run_timers(&mut view, &main_loop, 12), 4);
        assert_eq!(values.borrow().len(), 2);
    }

    #[test]
    fn test_slow_callback_delays_next_firing() {
        let (mut view, _, main_loop) = test_view();
        let clock = Rc::clone(&main_loop);
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let token = view
            .set_interval(
                Rc::new(move |_, _| {
                    counter.set(counter.get() + 1);
                    clock.advance(4);
                }),
                1,
            )
            .unwrap();

        assert!(view.on_timer(token));
        main_loop.advance(1);
        assert!(view.on_timer(token));
        assert_eq!(count.get(), 1);
        main_loop.advance(5);
        assert!(view.on_timer(token));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_interval_removing_itself() {
        let (mut view, _, main_loop) = test_view();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        view.set_interval(
            Rc::new(move |view, event| {
                counter.set(counter.get() + 1);
                view.clear_interval(event.token);
            }),
            10,
        )
        .unwrap();

        run_timers(&mut view, &main_loop, 100);
        assert_eq!(count.get(), 1);
        assert_eq!(view.timer_count(), 0);
        assert_eq!(main_loop.watch_count(), 0);
    }

    #[test]
    fn test_callback_may_clear_other_timers() {
        let (mut view, _, main_loop) = test_view();
        let (interval_values, interval_callback) = recorder();
        let (animation_values, animation_callback) = recorder();
        let interval = view.set_interval(interval_callback, 15).unwrap();
        let animation = view
            .begin_animation(animation_callback, 0, 100, 1000)
            .unwrap();

        let seen_at_clear = Rc::new(Cell::new(usize::MAX));
        let seen = Rc::clone(&seen_at_clear);
        let animation_log = Rc::clone(&animation_values);
        view.set_timeout(
            Rc::new(move |view, _| {
                view.clear_interval(interval);
                view.cancel_animation(animation);
                seen.set(animation_log.borrow().len());
            }),
            10,
        )
        .unwrap();

        run_timers(&mut view, &main_loop, 200);
        assert!(interval_values.borrow().is_empty());
        assert_eq!(animation_values.borrow().len(), seen_at_clear.get());
        assert_eq!(view.timer_kind(interval), None);
        assert_eq!(view.timer_kind(animation), None);
        assert_eq!(view.timer_count(), 0);
        assert_eq!(main_loop.watch_count(), 0);
    }

    #[test]
    fn test_animation_interpolates_to_end() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        let token = view.begin_animation(callback, 0, 100, 100).unwrap();
        assert_eq!(main_loop.watch_interval(token), Some(20));

        run_timers(&mut view, &main_loop, 300);
        assert_eq!(*values.borrow(), vec![0, 20, 40, 60, 80, 100]);
        assert_eq!(view.timer_count(), 0);
        assert_eq!(main_loop.watch_count(), 0);
    }

    #[test]
    fn test_animation_fires_only_on_change_and_at_completion() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        view.begin_animation(callback, 0, 2, 100).unwrap();

        run_timers(&mut view, &main_loop, 300);
        // 20ms: 0, 40ms: 1, 60ms: 1, 80ms: 2, 100ms: complete
        assert_eq!(*values.borrow(), vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_animation_runs_backwards() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        view.begin_animation(callback, 10, -10, 40).unwrap();
        run_timers(&mut view, &main_loop, 100);
        assert_eq!(*values.borrow(), vec![10, 0, -10]);
    }

    #[test]
    fn test_cancelled_animation_never_fires() {
        let (mut view, _, main_loop) = test_view();
        let (values, callback) = recorder();
        let token = view.begin_animation(callback, 0, 100, 100).unwrap();
        view.cancel_animation(token);

        run_timers(&mut view, &main_loop, 300);
        assert!(values.borrow().is_empty());
        assert_eq!(view.timer_count(), 0);
        assert_eq!(main_loop.watch_count(), 0);
    }

    #[test]
    fn test_unknown_token() {
        let (mut view, _, _) = test_view();
        assert!(matches!(
            view.remove_timer(TimerToken(99)),
            Err(GadgetError::TimerNotFound(99))
        ));
        view.clear_timeout(TimerToken(99));
        assert!(!view.on_timer(TimerToken(99)));
    }

    #[test]
    fn test_callback_sees_timer_event() {
        let (mut view, _, main_loop) = test_view();
        let seen = Rc::new(Cell::new(None));
        let record = Rc::clone(&seen);
        let token = view
            .set_timeout(
                Rc::new(move |view, _| {
                    record.set(view.event().and_then(|e| e.event().as_timer().copied()));
                }),
                5,
            )
            .unwrap();

        run_timers(&mut view, &main_loop, 5);
        assert_eq!(seen.get(), Some(TimerEvent { token, value: 0 }));
        assert!(view.event().is_none());
        assert_eq!(main_loop.current_time(), 5);
    }

    #[test]
    fn test_callback_may_destroy_view() {
        init_test_tracing();
        let (mut view, _, main_loop) = test_view();
        view.append_element(None, "div", "a").unwrap();
        view.set_interval(Rc::new(|_, _| {}), 10).unwrap();
        view.set_timeout(Rc::new(|view, _| view.destroy()), 5).unwrap();

        run_timers(&mut view, &main_loop, 100);
        assert!(view.is_destroyed());
        assert_eq!(view.timer_count(), 0);
        assert_eq!(main_loop.watch_count(), 0);
    }
}
