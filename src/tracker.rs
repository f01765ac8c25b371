//! The tracking engine: one owned instance holding session, counters and the
//! live-rate window, driven by edit/focus events and its own timers.

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::display::{DisplaySink, Notice};
use crate::error::Result;
use crate::language_stats::{EditEvent, LanguageStat, LanguageStats};
use crate::metrics::{self, MetricsSnapshot};
use crate::session::{SessionState, SessionTracker};
use crate::store::{StatsRecord, StatsStore};
use crate::time_series::SmoothingWindow;
use crate::timer::{Scheduler, TimerHandle, TimerKind, Timers};

/// User-facing commands. Answers go to the display sink as notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    ShowTime,
    ShowLanguageStats,
    ResetStats,
}

pub struct Tracker<C: Clock, S: StatsStore, D: DisplaySink> {
    config: Config,
    clock: C,
    store: S,
    sink: D,
    session: SessionTracker,
    languages: LanguageStats,
    window: SmoothingWindow,
    timers: Timers,
    refresh_timer: Option<TimerHandle>,
}

impl<C: Clock, S: StatsStore, D: DisplaySink> Tracker<C, S, D> {
    /// Restores the persisted record, renders a first snapshot and arms the
    /// refresh tick.
    pub fn init(config: Config, clock: C, store: S, sink: D) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "tracking with an invalid config");
        }
        let record = store.load();
        info!(
            total_active_ms = record.total_active_time,
            languages = record.language_stats.len(),
            "tracker initialized"
        );

        let mut tracker = Self {
            session: SessionTracker::new(config.idle_timeout_ms, record.total_active_time),
            languages: LanguageStats::from_entries(record.language_stats),
            window: SmoothingWindow::new(config.smoothing_window_ms),
            timers: Timers::new(),
            refresh_timer: None,
            config,
            clock,
            store,
            sink,
        };
        tracker.refresh();
        tracker.arm_refresh();
        tracker
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn language_stats(&self) -> &LanguageStats {
        &self.languages
    }

    pub fn totals(&self) -> LanguageStat {
        self.languages.totals()
    }

    pub fn total_active_ms(&self) -> u64 {
        self.session.total_active_ms(self.clock.now_ms())
    }

    /// Counts an edit and marks the user active. Edits to untracked documents
    /// are dropped without touching the session.
    pub fn record_edit(&mut self, event: &EditEvent) {
        if !self.languages.record_edit(event) {
            debug!(language = %event.language, scheme = ?event.scheme, "skipping untracked document");
            return;
        }
        self.record_activity();
    }

    pub fn record_activity(&mut self) {
        let now = self.clock.now_ms();
        self.session.record_activity(now, &mut self.timers);
    }

    pub fn focus_changed(&mut self, focused: bool) {
        if !focused {
            self.stop();
        }
    }

    /// Closes the open session, saving and refreshing. No-op when idle.
    pub fn stop(&mut self) {
        let now = self.clock.now_ms();
        if self.session.stop(now, &mut self.timers).is_some() {
            self.on_session_closed();
        }
    }

    fn on_session_closed(&mut self) {
        if let Err(e) = self.save() {
            error!(error = %e, "error saving time data");
        }
        self.refresh();
    }

    pub fn record(&self) -> StatsRecord {
        StatsRecord {
            total_active_time: self.session.state().accumulated_active_ms,
            language_stats: self.languages.entries().clone(),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(&self.record())
    }

    /// Current metrics without recording a new window sample.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let totals = self.languages.totals();
        MetricsSnapshot::compute(
            totals.characters,
            totals.words,
            self.total_active_ms(),
            self.window.smoothed_wpm(),
            self.config.target_wpm,
        )
    }

    /// Samples the live window, then renders the resulting snapshot.
    pub fn refresh(&mut self) -> MetricsSnapshot {
        let now = self.clock.now_ms();
        self.window.sample(self.languages.totals().words, now);

        let snapshot = self.snapshot();
        self.sink.render(&snapshot);
        snapshot
    }

    fn arm_refresh(&mut self) {
        if let Some(old) = self.refresh_timer.take() {
            self.timers.cancel(old);
        }
        let now = self.clock.now_ms();
        // a zero interval would re-arm at `now` and never leave poll_timers
        let interval = self.config.refresh_interval_ms.max(1);
        self.refresh_timer = Some(self.timers.schedule_after(now, interval, TimerKind::Refresh));
    }

    /// Fires every timer that is due. Returns how many fired.
    pub fn poll_timers(&mut self) -> usize {
        let mut fired = 0;
        loop {
            let now = self.clock.now_ms();
            let Some((handle, kind)) = self.timers.pop_due(now) else {
                break;
            };
            fired += 1;

            match kind {
                TimerKind::Idle => {
                    if self.session.on_idle_timer(handle, now).is_some() {
                        self.on_session_closed();
                    }
                }
                TimerKind::Refresh => {
                    if self.refresh_timer == Some(handle) {
                        self.refresh_timer = None;
                        self.refresh();
                        self.arm_refresh();
                    }
                }
            }
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::ShowTime => {
                let message = self.show_time();
                self.sink.notify(Notice::info(message));
            }
            Command::ShowLanguageStats => {
                let message = self.show_language_stats();
                self.sink.notify(Notice::info(message));
            }
            Command::ResetStats => match self.reset() {
                Ok(()) => {
                    self.sink
                        .notify(Notice::info("Coding stats have been completely reset."));
                    self.refresh();
                }
                Err(e) => {
                    self.sink
                        .notify(Notice::error(format!("Error resetting stats: {e}")));
                }
            },
        }
    }

    pub fn show_time(&self) -> String {
        metrics::total_time_message(self.total_active_ms(), &self.languages)
    }

    pub fn show_language_stats(&self) -> String {
        metrics::language_breakdown(self.total_active_ms(), &self.languages)
    }

    /// Stops any open session, zeroes all counters and the live window, and
    /// deletes the persisted record.
    pub fn reset(&mut self) -> Result<()> {
        self.stop();
        self.session.reset(&mut self.timers);
        self.languages.reset();
        self.window.clear();
        info!("statistics reset");

        self.store.erase()
    }

    /// Closes the session (saving it) and drops all pending timers.
    pub fn shutdown(&mut self) {
        self.stop();
        self.timers.clear();
        self.refresh_timer = None;
        info!(total_active_ms = self.total_active_ms(), "tracker shut down");
    }
}
