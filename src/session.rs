use tracing::{debug, info};

use crate::timer::{Scheduler, TimerHandle, TimerKind};

pub const IDLE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active: bool,
    pub session_start: Option<u64>,
    pub last_activity: u64,
    /// Sum of all closed sessions. Grows only when a session closes.
    pub accumulated_active_ms: u64,
}

/// Idle/active state machine. Holds at most one armed idle timer.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    state: SessionState,
    idle_timeout_ms: u64,
    idle_timer: Option<TimerHandle>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(IDLE_TIMEOUT_MS, 0)
    }
}

impl SessionTracker {
    pub fn new(idle_timeout_ms: u64, accumulated_active_ms: u64) -> Self {
        Self {
            state: SessionState {
                accumulated_active_ms,
                ..SessionState::default()
            },
            idle_timeout_ms,
            idle_timer: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms
    }

    pub fn idle_timer(&self) -> Option<TimerHandle> {
        self.idle_timer
    }

    pub fn record_activity(&mut self, now: u64, scheduler: &mut impl Scheduler) {
        if !self.state.active {
            self.state.active = true;
            self.state.session_start = Some(now);
            info!(at = now, "session started");
        }
        self.state.last_activity = now;

        if let Some(stale) = self.idle_timer.take() {
            scheduler.cancel(stale);
        }
        self.idle_timer = Some(scheduler.schedule_after(now, self.idle_timeout_ms, TimerKind::Idle));
    }

    /// Handles an expired idle timer. Returns the closed session's length if it
    /// actually closed one.
    pub fn on_idle_timer(&mut self, handle: TimerHandle, now: u64) -> Option<u64> {
        if self.idle_timer != Some(handle) {
            debug!(?handle, "ignoring superseded idle timer");
            return None;
        }
        self.idle_timer = None;

        let idle_for = now.saturating_sub(self.state.last_activity);
        if idle_for < self.idle_timeout_ms {
            debug!(idle_for, "idle timer fired early, session kept open");
            return None;
        }

        self.close(now)
    }

    /// Closes the open session, if any. Returns the closed session's length.
    pub fn stop(&mut self, now: u64, scheduler: &mut impl Scheduler) -> Option<u64> {
        if let Some(armed) = self.idle_timer.take() {
            scheduler.cancel(armed);
        }
        self.close(now)
    }

    fn close(&mut self, now: u64) -> Option<u64> {
        if !self.state.active {
            return None;
        }

        let start = self.state.session_start.take().unwrap_or(now);
        let length = now.saturating_sub(start);
        self.state.accumulated_active_ms += length;
        self.state.active = false;

        info!(
            length_ms = length,
            total_ms = self.state.accumulated_active_ms,
            "session stopped"
        );
        Some(length)
    }

    pub fn total_active_ms(&self, now: u64) -> u64 {
        let pending = match (self.state.active, self.state.session_start) {
            (true, Some(start)) => now.saturating_sub(start),
            _ => 0,
        };
        self.state.accumulated_active_ms + pending
    }

    /// Drops all accumulated time. Callers stop the session first.
    pub fn reset(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(armed) = self.idle_timer.take() {
            scheduler.cancel(armed);
        }
        self.state = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Timers;

    fn fire_due(tracker: &mut SessionTracker, timers: &mut Timers, now: u64) -> Option<u64> {
        let mut closed = None;
        while let Some((handle, kind)) = timers.pop_due(now) {
            if kind == TimerKind::Idle {
                closed = closed.or(tracker.on_idle_timer(handle, now));
            }
        }
        closed
    }

    #[test]
    fn first_activity_starts_session() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();

        tracker.record_activity(1_000, &mut timers);

        assert!(tracker.is_active());
        assert_eq!(tracker.state().session_start, Some(1_000));
        assert_eq!(tracker.state().last_activity, 1_000);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn repeated_activity_keeps_start_and_single_timer() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();

        for t in [0, 500, 1_900, 3_800, 5_000] {
            tracker.record_activity(t, &mut timers);
            assert_eq!(fire_due(&mut tracker, &mut timers, t), None);
        }

        assert_eq!(tracker.state().session_start, Some(0));
        assert_eq!(tracker.state().last_activity, 5_000);
        assert_eq!(tracker.state().accumulated_active_ms, 0);
        assert_eq!(timers.len(), 1);
        assert!(timers.is_pending(tracker.idle_timer().unwrap()));
    }

    #[test]
    fn idle_gap_closes_session() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();

        tracker.record_activity(0, &mut timers);
        tracker.record_activity(1_000, &mut timers);

        assert_eq!(fire_due(&mut tracker, &mut timers, 2_999), None);
        assert_eq!(fire_due(&mut tracker, &mut timers, 3_000), Some(3_000));
        assert!(!tracker.is_active());
        assert_eq!(tracker.state().session_start, None);
        assert_eq!(tracker.state().accumulated_active_ms, 3_000);
        assert_eq!(tracker.idle_timer(), None);
    }

    #[test]
    fn superseded_timer_is_ignored() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();

        tracker.record_activity(0, &mut timers);
        let stale = tracker.idle_timer().unwrap();
        tracker.record_activity(1_500, &mut timers);

        assert_eq!(tracker.on_idle_timer(stale, 2_000), None);
        assert!(tracker.is_active());
    }

    #[test]
    fn early_fire_is_rechecked_against_last_activity() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();

        tracker.record_activity(0, &mut timers);
        let armed = tracker.idle_timer().unwrap();

        assert_eq!(tracker.on_idle_timer(armed, 1_999), None);
        assert!(tracker.is_active());
    }

    #[test]
    fn stop_accumulates_and_is_idempotent() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();

        tracker.record_activity(10_000, &mut timers);
        assert_eq!(tracker.stop(70_000, &mut timers), Some(60_000));
        assert_eq!(tracker.stop(80_000, &mut timers), None);

        assert_eq!(tracker.state().accumulated_active_ms, 60_000);
        assert!(timers.is_empty());
    }

    #[test]
    fn total_includes_open_session() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::new(IDLE_TIMEOUT_MS, 5_000);

        assert_eq!(tracker.total_active_ms(100), 5_000);

        tracker.record_activity(1_000, &mut timers);
        assert_eq!(tracker.total_active_ms(1_000), 5_000);
        assert_eq!(tracker.total_active_ms(1_800), 5_800);

        tracker.stop(2_000, &mut timers);
        assert_eq!(tracker.total_active_ms(9_000), 6_000);
    }

    #[test]
    fn total_never_moves_backward() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::default();
        let mut last = 0;

        for t in (0..20_000).step_by(250) {
            match t % 5_000 {
                0 => tracker.record_activity(t, &mut timers),
                1_000 => tracker.record_activity(t, &mut timers),
                _ => {}
            }
            fire_due(&mut tracker, &mut timers, t);

            let total = tracker.total_active_ms(t);
            assert!(total >= last, "total went from {last} to {total} at {t}");
            last = total;
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut timers = Timers::new();
        let mut tracker = SessionTracker::new(IDLE_TIMEOUT_MS, 42_000);
        tracker.record_activity(0, &mut timers);
        tracker.stop(1_000, &mut timers);

        tracker.reset(&mut timers);

        assert_eq!(tracker.state(), &SessionState::default());
        assert_eq!(tracker.total_active_ms(5_000), 0);
    }
}
