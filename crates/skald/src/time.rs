//! Frame timing and delta time.
//!
//! [`Time`] is advanced once per frame by
//! [`EngineContext::frame`](crate::context::EngineContext::frame) with the raw
//! wall-clock delta. The delta every system sees is clamped and scaled:
//!
//! - negative deltas (clock went backwards) become `0`
//! - deltas above `max_delta_secs` (a breakpoint, a window drag) become
//!   `fallback_delta_secs`, one nominal frame
//! - the result is multiplied by `time_scale` (slow motion, pause at `0`)

use crate::config::EngineConfig;

/// Frame timing state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    /// Clamped and scaled delta for the current frame.
    delta: f32,
    /// The delta as passed in, before clamping.
    raw_delta: f32,
    /// Sum of all scaled deltas.
    elapsed: f64,
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame.
    pub fn advance(&mut self, raw_delta: f32, config: &EngineConfig) {
        self.raw_delta = raw_delta;
        self.delta = clamp_delta(raw_delta, config);
        self.elapsed += f64::from(self.delta);
        self.frame_count += 1;
    }

    /// Delta time in seconds, the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta
    }

    pub fn raw_delta_secs(&self) -> f32 {
        self.raw_delta
    }

    /// Total scaled time since the context was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last raw delta.
    pub fn fps(&self) -> f32 {
        if self.raw_delta > 0.0 {
            1.0 / self.raw_delta
        } else {
            0.0
        }
    }

    /// Restart the clock, e.g. when gameplay begins.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn clamp_delta(raw: f32, config: &EngineConfig) -> f32 {
    let delta = if raw.is_nan() || raw <= 0.0 {
        0.0
    } else if raw > config.max_delta_secs {
        config.fallback_delta_secs
    } else {
        raw
    };
    delta * config.time_scale
}
