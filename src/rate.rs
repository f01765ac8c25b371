pub const MS_PER_MINUTE: u64 = 60_000;

/// Below this many active minutes every rate reads as zero.
const MIN_ACTIVE_MINUTES: f64 = 0.001;

pub fn minutes(active_ms: u64) -> f64 {
    active_ms as f64 / MS_PER_MINUTE as f64
}

/// Whole elapsed minutes, as shown on the status line
pub fn whole_minutes(active_ms: u64) -> u64 {
    active_ms / MS_PER_MINUTE
}

fn per_minute(count: u64, active_ms: u64) -> u64 {
    let active_minutes = minutes(active_ms);

    match count {
        0 => 0,
        _ if active_minutes < MIN_ACTIVE_MINUTES => 0,
        positive => (positive as f64 / active_minutes).round() as u64,
    }
}

/// Characters per minute of active time
pub fn cpm(total_characters: u64, active_ms: u64) -> u64 {
    per_minute(total_characters, active_ms)
}

/// Words per minute of active time
pub fn wpm(total_words: u64, active_ms: u64) -> u64 {
    per_minute(total_words, active_ms)
}

/// Score for sustained typing: ten points per minute spent at the target rate.
pub fn points(wpm: u64, total_minutes: u64, target_wpm: u64) -> u64 {
    if wpm == 0 || total_minutes == 0 || target_wpm == 0 {
        return 0;
    }

    ((wpm as f64 / target_wpm as f64) * total_minutes as f64 * 10.0).round() as u64
}

/// Live rate relative to the target; zero until a full minute has been tracked.
pub fn ratio(live_wpm: u64, total_minutes: u64, target_wpm: u64) -> f64 {
    if total_minutes == 0 || target_wpm == 0 {
        return 0.0;
    }

    live_wpm as f64 / target_wpm as f64
}
