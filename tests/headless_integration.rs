use std::sync::mpsc;
use std::time::Duration;

use codetime::clock::ManualClock;
use codetime::config::Config;
use codetime::display::MemorySink;
use codetime::language_stats::{DocumentScheme, EditEvent};
use codetime::runtime::{FixedTicker, Runner, TestEventSource, TrackerEvent};
use codetime::store::{FileStatsStore, StatsStore};
use codetime::{Command, Tracker};

// Headless integration using the runtime + Tracker without a TTY.
// Each event is followed by 100ms of simulated time, like the real loop's tick.
fn drive(
    tracker: &mut Tracker<ManualClock, FileStatsStore, MemorySink>,
    clock: &ManualClock,
    events: Vec<TrackerEvent>,
) {
    let (tx, rx) = mpsc::channel();
    for ev in events {
        tx.send(ev).unwrap();
    }
    drop(tx);

    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    for _ in 0..10_000u32 {
        match runner.step() {
            TrackerEvent::Edit(edit) => tracker.record_edit(&edit),
            TrackerEvent::Focus(focused) => tracker.focus_changed(focused),
            TrackerEvent::Command(command) => tracker.execute(command),
            TrackerEvent::Closed => break,
            _ => {}
        }
        clock.advance(100);
        tracker.poll_timers();
    }
}

#[test]
fn headless_typing_flow_tracks_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timeData.json");
    let clock = ManualClock::new(0);
    let mut tracker = Tracker::init(
        Config::default(),
        clock.clone(),
        FileStatsStore::with_path(&path),
        MemorySink::new(),
    );

    let events = "hello world "
        .chars()
        .map(|c| TrackerEvent::Edit(EditEvent::typed("markdown", c.to_string())))
        .collect();
    drive(&mut tracker, &clock, events);

    // 12 keystrokes 100ms apart, last one at 1100
    assert!(tracker.is_active());
    assert_eq!(tracker.session().session_start, Some(0));

    clock.advance(2_000);
    tracker.poll_timers();

    assert!(!tracker.is_active());
    let stat = tracker.language_stats().get("markdown").copied().unwrap();
    assert_eq!(stat.characters, 12);
    assert_eq!(stat.words, 2);

    let saved = FileStatsStore::with_path(&path).load();
    assert_eq!(saved, tracker.record());
    assert!(saved.total_active_time >= 3_100);
}

#[test]
fn headless_focus_loss_stops_session() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(0);
    let mut tracker = Tracker::init(
        Config::default(),
        clock.clone(),
        FileStatsStore::with_path(dir.path().join("timeData.json")),
        MemorySink::new(),
    );

    drive(
        &mut tracker,
        &clock,
        vec![
            TrackerEvent::Edit(EditEvent::typed("rust", "fn main() {}")),
            TrackerEvent::Focus(false),
        ],
    );

    assert!(!tracker.is_active());
    // stopped one tick after the edit
    assert_eq!(tracker.session().accumulated_active_ms, 100);
}

#[test]
fn headless_ignores_preview_buffers() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(0);
    let mut tracker = Tracker::init(
        Config::default(),
        clock.clone(),
        FileStatsStore::with_path(dir.path().join("timeData.json")),
        MemorySink::new(),
    );

    drive(
        &mut tracker,
        &clock,
        vec![TrackerEvent::Edit(
            EditEvent::typed("log", "build output").with_scheme(DocumentScheme::Other("output".into())),
        )],
    );

    assert!(!tracker.is_active());
    assert!(tracker.language_stats().is_empty());
    assert_eq!(tracker.total_active_ms(), 0);
}

#[test]
fn headless_reset_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timeData.json");
    let clock = ManualClock::new(0);
    let mut tracker = Tracker::init(
        Config::default(),
        clock.clone(),
        FileStatsStore::with_path(&path),
        MemorySink::new(),
    );

    drive(
        &mut tracker,
        &clock,
        vec![
            TrackerEvent::Edit(EditEvent::typed("rust", "let a = 1;")),
            TrackerEvent::Focus(false),
            TrackerEvent::Command(Command::ResetStats),
        ],
    );

    assert!(!path.exists());
    assert_eq!(tracker.total_active_ms(), 0);
    assert!(tracker.language_stats().is_empty());
    assert_eq!(
        tracker.sink().last_notice().unwrap().text,
        "Coding stats have been completely reset."
    );
}
