//! Frame clock
//!
//! Converts wall time between rendered frames into a normalized step where
//! 1.0 is one frame at the 60 Hz baseline.

use crate::consts::{FRAME_MS, FRAMES_PER_SEC, MAX_FRAME_STEPS};

/// One normalized step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Normalized frames, in `0.0..=MAX_FRAME_STEPS`
    pub dt: f32,
    /// Simulation milliseconds covered by this step
    pub ms: f64,
}

impl FrameStep {
    /// Normalize and clamp the wall time since the previous frame.
    /// Negative and non-finite inputs count as no time at all.
    pub fn from_elapsed_ms(elapsed_ms: f64) -> Self {
        let frames = if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            (elapsed_ms / FRAME_MS).min(MAX_FRAME_STEPS as f64)
        } else {
            0.0
        };
        Self {
            dt: frames as f32,
            ms: frames * FRAME_MS,
        }
    }

    /// Exactly `frames` nominal frames (tests, headless runs)
    pub fn frames(frames: f32) -> Self {
        Self::from_elapsed_ms(frames as f64 * FRAME_MS)
    }

    /// Seconds of mode timer consumed by this step
    pub fn secs(&self) -> f32 {
        self.dt / FRAMES_PER_SEC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_frame_is_one_unit() {
        let step = FrameStep::from_elapsed_ms(FRAME_MS);
        assert!((step.dt - 1.0).abs() < 1e-6);
        assert!((step.secs() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_stall_is_clamped() {
        let step = FrameStep::from_elapsed_ms(10_000.0);
        assert_eq!(step.dt, MAX_FRAME_STEPS);
        assert!((step.ms - 5.0 * FRAME_MS).abs() < 1e-9);
    }

    #[test]
    fn test_bad_input_is_zero() {
        assert_eq!(FrameStep::from_elapsed_ms(-5.0).dt, 0.0);
        assert_eq!(FrameStep::from_elapsed_ms(f64::NAN).dt, 0.0);
    }
}
