//! Sliding-window input framerate estimation.

use std::collections::VecDeque;

/// Window over which the passthrough input framerate is averaged.
pub const FRAME_RATE_AVERAGING_WINDOW_MS: i64 = 1000;

/// Sliding-window event rate counter.
///
/// Samples older than the window are pruned on every operation. The estimate
/// is computed over the active window (oldest retained sample to now) and is
/// absent until at least two samples are retained, so a single stray frame
/// never reports a rate.
#[derive(Debug)]
pub struct RateCounter {
    window_ms: i64,
    scale: i64,
    samples: VecDeque<i64>,
}

impl RateCounter {
    /// Counter over `window_ms` reporting `count * scale / window`. A scale
    /// of 1000 with millisecond samples reports Hz.
    pub fn new(window_ms: i64, scale: i64) -> Self {
        Self { window_ms, scale, samples: VecDeque::new() }
    }

    /// Record one event at `now_ms`.
    pub fn update(&mut self, now_ms: i64) {
        self.samples.push_back(now_ms);
        self.prune(now_ms);
    }

    /// Estimated rate at `now_ms`, absent when fewer than two samples remain
    /// in the window.
    pub fn rate(&mut self, now_ms: i64) -> Option<u32> {
        self.prune(now_ms);
        let first = self.samples.front().copied()?;
        if self.samples.len() < 2 {
            return None;
        }
        let active_ms = (now_ms - first + 1).clamp(1, self.window_ms);
        let count = self.samples.len() as i64;
        Some(((count * self.scale + active_ms / 2) / active_ms) as u32)
    }

    fn prune(&mut self, now_ms: i64) {
        while let Some(&sample) = self.samples.front() {
            if sample <= now_ms - self.window_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn hz_counter() -> RateCounter {
        RateCounter::new(FRAME_RATE_AVERAGING_WINDOW_MS, 1000)
    }

    #[test]
    fn no_estimate_without_samples() {
        let mut counter = hz_counter();
        assert_eq!(counter.rate(0), None);
        assert_eq!(counter.rate(10_000), None);
    }

    #[test]
    fn no_estimate_from_single_sample() {
        let mut counter = hz_counter();
        counter.update(100);
        assert_eq!(counter.rate(100), None);
    }

    #[test]
    fn steady_input_reports_close_to_nominal() {
        let mut counter = hz_counter();
        // 10 fps for one window: samples at 0, 100, ..., 900.
        for i in 0..10 {
            counter.update(i * 100);
        }
        // Active window is 901 ms holding 10 samples.
        assert_eq!(counter.rate(900), Some(11));
        // A full window later the oldest samples fall out.
        counter.update(1000);
        assert_eq!(counter.rate(1000), Some(11));
    }

    #[test]
    fn stale_samples_are_pruned() {
        let mut counter = hz_counter();
        counter.update(0);
        counter.update(100);
        assert!(counter.rate(100).is_some());
        // One window later both samples are stale.
        assert_eq!(counter.rate(1200), None);
    }

    #[test]
    fn estimate_decays_as_input_stops() {
        let mut counter = hz_counter();
        for i in 0..30 {
            counter.update(i * 33);
        }
        let while_running = counter.rate(29 * 33).expect("rate while running");
        assert!(while_running >= 29 && while_running <= 32, "got {while_running}");
        // 2 s of silence drains the window entirely.
        assert_eq!(counter.rate(29 * 33 + 2000), None);
    }

    proptest! {
        #[test]
        fn prop_rate_requires_two_samples_in_window(start in 0i64..1_000_000) {
            let mut counter = hz_counter();
            counter.update(start);
            prop_assert_eq!(counter.rate(start), None);
            counter.update(start + 1);
            prop_assert!(counter.rate(start + 1).is_some());
        }

        #[test]
        fn prop_rate_bounded_by_sample_count_scaled(
            offsets in prop::collection::vec(0i64..1000, 2..50)
        ) {
            let mut counter = hz_counter();
            let mut sorted = offsets.clone();
            sorted.sort_unstable();
            for offset in &sorted {
                counter.update(*offset);
            }
            let now = *sorted.last().unwrap();
            if let Some(rate) = counter.rate(now) {
                // With a 1 s window the rate can never exceed count * scale.
                prop_assert!(rate as usize <= sorted.len() * 1000);
                prop_assert!(rate >= 1);
            }
        }

        #[test]
        fn prop_everything_outside_window_is_forgotten(gap in 1001i64..100_000) {
            let mut counter = hz_counter();
            for i in 0..20 {
                counter.update(i * 10);
            }
            prop_assert_eq!(counter.rate(190 + gap), None);
        }
    }
}
