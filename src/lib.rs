//! Sky Dodge - An endless side-scrolling dodge game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, abilities, spawning, scoring)
//! - `config`: Data-driven tunables for the simulation
//!
//! Rendering, audio and input capture live outside this crate. They talk to
//! the simulation only through [`sim::Simulation`] commands, snapshots and
//! drained [`sim::SimEvent`]s.

pub mod config;
pub mod sim;

pub use config::SimConfig;
pub use sim::{Simulation, SimEvent};

/// Frame timing constants
pub mod consts {
    /// Expected duration of one frame in milliseconds (60 Hz baseline)
    pub const FRAME_MS: f64 = 16.67;
    /// Nominal frames per second; mode timers count down by `dt / FRAMES_PER_SEC` seconds
    pub const FRAMES_PER_SEC: f32 = 60.0;
    /// Largest normalized step a single tick may take (stall protection)
    pub const MAX_FRAME_STEPS: f32 = 5.0;

    /// Visual tilt per unit of vertical velocity (degrees)
    pub const ROTATION_PER_VELOCITY: f32 = 2.0;
    /// Tilt is clamped to +/- this many degrees
    pub const MAX_ROTATION_DEG: f32 = 30.0;
}

/// Axis-aligned overlap test with inclusive edges (touching counts).
#[inline]
pub fn spans_overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    a_max >= b_min && a_min <= b_max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_overlap_touching_edges() {
        assert!(spans_overlap(0.0, 10.0, 10.0, 20.0));
        assert!(spans_overlap(5.0, 6.0, 0.0, 20.0));
        assert!(!spans_overlap(0.0, 9.9, 10.0, 20.0));
    }
}
