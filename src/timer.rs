//! Cancellable one-shot timers for a single-threaded event loop.
//!
//! Nothing here runs on its own: the owner polls [`Timers::pop_due`] between
//! events and dispatches whatever has expired.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Closes the typing session after a period without edits
    Idle,
    /// Recomputes metrics and pushes them to the display
    Refresh,
}

pub trait Scheduler {
    fn schedule_after(&mut self, now: u64, delay_ms: u64, kind: TimerKind) -> TimerHandle;
    /// Returns false if the timer already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    kind: TimerKind,
    deadline: u64,
}

#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    pending: Vec<Pending>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerHandle, TimerKind)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= now)
            .min_by_key(|(_, p)| (p.deadline, p.handle.0))
            .map(|(idx, _)| idx)?;

        let fired = self.pending.remove(idx);
        Some((fired.handle, fired.kind))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Scheduler for Timers {
    fn schedule_after(&mut self, now: u64, delay_ms: u64, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            kind,
            deadline: now.saturating_add(delay_ms),
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_deadline() {
        let mut timers = Timers::new();
        let handle = timers.schedule_after(1_000, 2_000, TimerKind::Idle);

        assert_eq!(timers.pop_due(2_999), None);
        assert_eq!(timers.pop_due(3_000), Some((handle, TimerKind::Idle)));
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = Timers::new();
        let handle = timers.schedule_after(0, 10, TimerKind::Idle);

        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert_eq!(timers.pop_due(100), None);
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut timers = Timers::new();
        let late = timers.schedule_after(0, 500, TimerKind::Refresh);
        let early = timers.schedule_after(0, 100, TimerKind::Idle);

        assert_eq!(timers.next_deadline(), Some(100));
        assert_eq!(timers.pop_due(1_000), Some((early, TimerKind::Idle)));
        assert_eq!(timers.pop_due(1_000), Some((late, TimerKind::Refresh)));
        assert_eq!(timers.pop_due(1_000), None);
    }

    #[test]
    fn handles_are_unique() {
        let mut timers = Timers::new();
        let a = timers.schedule_after(0, 1, TimerKind::Idle);
        let b = timers.schedule_after(0, 1, TimerKind::Idle);
        assert_ne!(a, b);
        assert!(timers.is_pending(a) && timers.is_pending(b));
    }
}
