use std::time::Duration;

use log::debug;

/// Frame rate assumed when the stream does not declare one
pub const FALLBACK_FPS: f64 = 25.0;

/// Holds frames back to the source's declared cadence.
///
/// Late frames are never dropped: when processing already took longer than
/// the frame's duration the next frame follows immediately, so sustained
/// lateness drifts behind real time.
#[derive(Debug, Clone, Copy)]
pub struct PacingController {
    fallback: Duration,
}

impl PacingController {
    /// Pace with `fallback` for frames that carry no duration of their own
    pub fn new(fallback: Duration) -> Self {
        Self { fallback }
    }

    /// Build from a stream's average frame rate (`numerator / denominator`)
    pub fn from_frame_rate(numerator: i32, denominator: i32) -> Self {
        let fps = if numerator > 0 && denominator > 0 {
            f64::from(numerator) / f64::from(denominator)
        } else {
            FALLBACK_FPS
        };
        Self::new(Duration::from_secs_f64(1.0 / fps))
    }

    /// Duration of one frame: the frame's own when present, else the
    /// stream average
    pub fn frame_duration(&self, declared: Option<Duration>) -> Duration {
        declared.filter(|d| !d.is_zero()).unwrap_or(self.fallback)
    }

    /// Time left to wait after `processing` was spent on the frame
    pub fn delay(&self, declared: Option<Duration>, processing: Duration) -> Duration {
        self.frame_duration(declared).saturating_sub(processing)
    }

    /// Block the pipeline thread for the remaining time, returning the wait
    pub fn wait(&self, declared: Option<Duration>, processing: Duration) -> Duration {
        let delay = self.delay(declared, processing);
        if delay.is_zero() {
            debug!("Frame late by {:?}", processing.saturating_sub(self.frame_duration(declared)));
        } else {
            std::thread::sleep(delay);
        }
        delay
    }
}
