use std::time::{Duration, Instant};

const FALLBACK_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Ticks owed for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameSteps {
    pub(crate) ticks: u32,
    /// Backlog thrown away because the per-frame tick limit was reached.
    pub(crate) dropped: Duration,
}

/// Fixed-timestep clock. Frame time goes in, a whole number of ticks comes out,
/// and the fractional remainder carries over to the next frame.
#[derive(Debug, Clone)]
pub(crate) struct FixedStep {
    step: Duration,
    max_frame_delta: Duration,
    max_ticks: u32,
    owed: Duration,
}

impl FixedStep {
    pub(crate) fn new(ticks_per_second: u32, max_frame_delta: Duration, max_ticks: u32) -> Self {
        let max_frame_delta = if max_frame_delta.is_zero() {
            FALLBACK_MAX_FRAME_DELTA
        } else {
            max_frame_delta
        };
        Self {
            step: Duration::from_secs_f64(1.0 / f64::from(ticks_per_second.max(1))),
            max_frame_delta,
            max_ticks: max_ticks.max(1),
            owed: Duration::ZERO,
        }
    }

    pub(crate) fn step_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    pub(crate) fn ticks_per_second(&self) -> f64 {
        1.0 / self.step.as_secs_f64()
    }

    pub(crate) fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    pub(crate) fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    /// A single long frame (a stall, a dragged window) counts as at most
    /// `max_frame_delta`. Whatever still exceeds `max_ticks` steps is dropped.
    pub(crate) fn advance(&mut self, frame_delta: Duration) -> FrameSteps {
        self.owed = self
            .owed
            .saturating_add(frame_delta.min(self.max_frame_delta));

        let mut ticks = 0;
        while self.owed >= self.step && ticks < self.max_ticks {
            self.owed -= self.step;
            ticks += 1;
        }

        let dropped = if self.owed >= self.step {
            std::mem::take(&mut self.owed)
        } else {
            Duration::ZERO
        };
        FrameSteps { ticks, dropped }
    }
}

/// Render-rate cap. Instead of sleeping, the loop asks when the next redraw is due
/// and parks the event loop until then.
#[derive(Debug, Clone)]
pub(crate) struct RenderPacer {
    cap: Option<u32>,
    frame_budget: Option<Duration>,
    last_present: Option<Instant>,
}

impl RenderPacer {
    /// `None` or `Some(0)` leaves rendering uncapped.
    pub(crate) fn new(max_fps: Option<u32>) -> Self {
        let cap = max_fps.filter(|fps| *fps > 0);
        Self {
            cap,
            frame_budget: cap.map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            last_present: None,
        }
    }

    pub(crate) fn cap(&self) -> Option<u32> {
        self.cap
    }

    pub(crate) fn presented(&mut self, at: Instant) {
        self.last_present = Some(at);
    }

    /// When the next frame may be drawn, or `None` if it may be drawn now.
    pub(crate) fn wait_until(&self, now: Instant) -> Option<Instant> {
        let due = self.last_present? + self.frame_budget?;
        (due > now).then_some(due)
    }
}
