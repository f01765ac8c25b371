use itertools::Itertools;
use serde::Serialize;

use crate::language_stats::LanguageStats;
use crate::rate;

/// How the live rate compares to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Over,
    OnTarget,
    Under,
}

const OVER_RATIO: f64 = 1.05;
const NEAR_RATIO: f64 = 0.95;

impl Band {
    /// Both boundaries (exactly 0.95 and exactly 1.05) fall to `Under`.
    pub fn classify(ratio: f64) -> Self {
        if ratio > OVER_RATIO {
            Band::Over
        } else if ratio > NEAR_RATIO && ratio < OVER_RATIO {
            Band::OnTarget
        } else {
            Band::Under
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub points: u64,
    pub elapsed_minutes: u64,
    pub total_words: u64,
    pub total_characters: u64,
    pub cpm: u64,
    /// All-time average
    pub wpm: u64,
    /// Trailing-window rate
    pub live_wpm: u64,
    pub target_wpm: u64,
    pub band: Band,
}

impl MetricsSnapshot {
    pub fn compute(
        total_characters: u64,
        total_words: u64,
        active_ms: u64,
        live_wpm: u64,
        target_wpm: u64,
    ) -> Self {
        let cpm = rate::cpm(total_characters, active_ms);
        let wpm = rate::wpm(total_words, active_ms);
        let elapsed_minutes = rate::whole_minutes(active_ms);

        Self {
            points: rate::points(wpm, elapsed_minutes, target_wpm),
            elapsed_minutes,
            total_words,
            total_characters,
            cpm,
            wpm,
            live_wpm,
            target_wpm,
            band: Band::classify(rate::ratio(live_wpm, elapsed_minutes, target_wpm)),
        }
    }

    pub fn status_text(&self) -> String {
        format!(
            "| * {} Pts | {}m | {} Words | {} CPM / {} WPM",
            self.points, self.elapsed_minutes, self.total_words, self.cpm, self.live_wpm
        )
    }

    pub fn tooltip(&self) -> String {
        [
            format!(
                "Formula: ({} WPM / {}) * {}m",
                self.wpm, self.target_wpm, self.elapsed_minutes
            ),
            format!("Total Time: {} minutes", self.elapsed_minutes),
            format!("Total Chars: {} chars.", self.total_characters),
            format!("Speed: {} CPM", self.cpm),
            format!("Live Speed: {} WPM", self.live_wpm),
            format!("Target: {} WPM", self.target_wpm),
        ]
        .join("\n")
    }
}

/// `Total time: 3 min 5 sec. Avg Rate: 120 CPM / 22 WPM`
pub fn total_time_message(active_ms: u64, stats: &LanguageStats) -> String {
    let totals = stats.totals();
    let seconds = (active_ms as f64 / 1000.0).round() as u64;

    format!(
        "Total time: {} min {} sec. Avg Rate: {} CPM / {} WPM",
        seconds / 60,
        seconds % 60,
        rate::cpm(totals.characters, active_ms),
        rate::wpm(totals.words, active_ms)
    )
}

/// Per-language lines, busiest language first. Rates use the overall active
/// time since time is not tracked per language.
pub fn language_breakdown(active_ms: u64, stats: &LanguageStats) -> String {
    let lines = stats
        .iter()
        .sorted_by(|a, b| b.1.characters.cmp(&a.1.characters).then_with(|| a.0.cmp(b.0)))
        .map(|(language, stat)| {
            format!(
                "{}: {} chars, {} words ({} CPM / {} WPM)",
                language.to_uppercase(),
                stat.characters,
                stat.words,
                rate::cpm(stat.characters, active_ms),
                rate::wpm(stat.words, active_ms)
            )
        })
        .join("\n");

    format!("--- Language Status ---\n{lines}")
}
