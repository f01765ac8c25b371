use std::collections::VecDeque;

use crate::rate::MS_PER_MINUTE;

pub const DEFAULT_WINDOW_MS: u64 = 60_000;

/// Samples closer together than this are too noisy to report a rate from.
const MIN_SPAN_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub t: u64,
    pub words: u64,
}

impl Sample {
    pub fn new(t: u64, words: u64) -> Self {
        Self { t, words }
    }
}

/// Trailing log of cumulative word counts used for the live WPM.
///
/// Samples must arrive in non-decreasing time order; eviction only ever pops
/// from the front.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    window_ms: u64,
    samples: VecDeque<Sample>,
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl SmoothingWindow {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            samples: VecDeque::new(),
        }
    }

    pub fn sample(&mut self, cumulative_words: u64, now: u64) {
        self.samples.push_back(Sample::new(now, cumulative_words));

        let cutoff = now.saturating_sub(self.window_ms);
        while self.samples.front().is_some_and(|s| s.t < cutoff) {
            self.samples.pop_front();
        }
    }

    pub fn smoothed_wpm(&self) -> u64 {
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return 0;
        };
        if self.samples.len() < 2 {
            return 0;
        }

        let span_ms = newest.t.saturating_sub(oldest.t);
        if span_ms < MIN_SPAN_MS {
            return 0;
        }

        let words = newest.words.saturating_sub(oldest.words);
        (words as f64 / (span_ms as f64 / MS_PER_MINUTE as f64)).round() as u64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_with(samples: &[(u64, u64)]) -> SmoothingWindow {
        let mut window = SmoothingWindow::default();
        for &(t, words) in samples {
            window.sample(words, t);
        }
        window
    }

    #[test]
    fn test_half_minute_span() {
        let window = window_with(&[(0, 0), (30_000, 25)]);
        assert_eq!(window.smoothed_wpm(), 50);
    }

    #[test]
    fn test_single_sample_is_zero() {
        let window = window_with(&[(5_000, 40)]);
        assert_eq!(window.smoothed_wpm(), 0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(SmoothingWindow::default().smoothed_wpm(), 0);
    }

    #[test]
    fn test_short_span_is_zero() {
        let window = window_with(&[(0, 0), (400, 3), (999, 9)]);
        assert_eq!(window.len(), 3);
        assert_eq!(window.smoothed_wpm(), 0);
    }

    #[test]
    fn test_evicts_samples_older_than_window() {
        let window = window_with(&[(0, 0), (30_000, 10), (61_000, 40), (90_000, 70)]);

        let kept: Vec<Sample> = window.samples().copied().collect();
        assert_eq!(
            kept,
            vec![
                Sample::new(30_000, 10),
                Sample::new(61_000, 40),
                Sample::new(90_000, 70)
            ]
        );
        // 60 words over a full minute
        assert_eq!(window.smoothed_wpm(), 60);
    }

    #[test]
    fn test_sample_exactly_at_cutoff_is_kept() {
        let window = window_with(&[(0, 0), (60_000, 30)]);
        assert_eq!(window.len(), 2);
        assert_eq!(window.smoothed_wpm(), 30);
    }

    #[test]
    fn test_idle_window_reads_zero() {
        let window = window_with(&[(0, 12), (20_000, 12), (40_000, 12)]);
        assert_eq!(window.smoothed_wpm(), 0);
    }

    #[test]
    fn test_clear() {
        let mut window = window_with(&[(0, 0), (10_000, 5)]);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.smoothed_wpm(), 0);
    }
}
