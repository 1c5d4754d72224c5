use std::time::{Duration, Instant};

/// Frames and ticks per second over the last completed window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LoopRates {
    pub(crate) fps: f32,
    pub(crate) tps: f32,
}

/// Counts frames and ticks; every `length` the counts become a fresh `LoopRates`.
#[derive(Debug)]
pub(crate) struct RateWindow {
    opened_at: Instant,
    length: Duration,
    frames: u32,
    ticks: u32,
    latest: LoopRates,
}

impl RateWindow {
    pub(crate) fn open(now: Instant, length: Duration) -> Self {
        Self {
            opened_at: now,
            length: if length.is_zero() {
                Duration::from_secs(1)
            } else {
                length
            },
            frames: 0,
            ticks: 0,
            latest: LoopRates::default(),
        }
    }

    pub(crate) fn count_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    pub(crate) fn count_ticks(&mut self, ticks: u32) {
        self.ticks = self.ticks.saturating_add(ticks);
    }

    pub(crate) fn latest(&self) -> LoopRates {
        self.latest
    }

    /// Closes the window once it has run its length and returns the new rates.
    pub(crate) fn roll(&mut self, now: Instant) -> Option<LoopRates> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.length {
            return None;
        }
        let seconds = elapsed.as_secs_f32();
        self.latest = LoopRates {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
        };
        self.opened_at = now;
        self.frames = 0;
        self.ticks = 0;
        Some(self.latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_stays_open_until_its_length_passes() {
        let start = Instant::now();
        let mut window = RateWindow::open(start, Duration::from_secs(1));
        window.count_frame();

        assert_eq!(window.roll(start + Duration::from_millis(999)), None);
        assert_eq!(window.latest(), LoopRates::default());
    }

    #[test]
    fn rates_are_counts_over_elapsed_time() {
        let start = Instant::now();
        let mut window = RateWindow::open(start, Duration::from_secs(1));
        for _ in 0..30 {
            window.count_frame();
            window.count_ticks(2);
        }

        let rates = window.roll(start + Duration::from_secs(2)).expect("closed");

        assert_eq!(rates, LoopRates { fps: 15.0, tps: 30.0 });
        assert_eq!(window.latest(), rates);
    }

    #[test]
    fn rolling_starts_an_empty_window() {
        let start = Instant::now();
        let mut window = RateWindow::open(start, Duration::from_millis(500));
        window.count_frame();
        window.roll(start + Duration::from_millis(500));

        let rates = window
            .roll(start + Duration::from_secs(1))
            .expect("second window");

        assert_eq!(rates, LoopRates::default());
    }

    #[test]
    fn zero_length_falls_back_to_one_second() {
        let start = Instant::now();
        let mut window = RateWindow::open(start, Duration::ZERO);

        assert_eq!(window.roll(start + Duration::from_millis(10)), None);
        assert!(window.roll(start + Duration::from_secs(1)).is_some());
    }
}
