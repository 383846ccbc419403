//! Tuning - Slider-to-coefficient resolver
//!
//! Maps the chaos and catch-up sliders onto the concrete coefficients the
//! pacing model uses. Computed once per race.

use serde::{Deserialize, Serialize};

use crate::race_engine::config::RaceConfig;

pub fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

/// Per-race pacing coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Wobble amplitude (fraction of base velocity)
    pub noise_amplitude: f32,
    pub burst_events_per_minute: f32,
    pub brake_events_per_minute: f32,
    pub burst_probability: f32,
    pub brake_probability: f32,
    /// Burst impulse ceiling (world units/frame)
    pub burst_magnitude: f32,
    /// Brake impulse ceiling (world units/frame)
    pub brake_magnitude: f32,
    pub catch_up_max: f32,
    /// Lower exponent means a stronger boost for small gaps
    pub catch_up_exponent: f32,
    pub leader_penalty_max: f32,
    pub endgame_tightening_max: f32,
    /// World units per frame needed to finish on schedule
    pub unit_rate: f32,
}

impl Tuning {
    pub fn resolve(chaos: f32, catch_up: f32, fps: f32, total_frames: u32) -> Self {
        let chaos = chaos.clamp(0.0, 1.0);
        let catch_up = catch_up.clamp(0.0, 1.0);
        let unit_rate = crate::race_engine::TRACK_LENGTH / total_frames.max(1) as f32;
        let frames_per_minute = 60.0 * fps.max(1.0);

        let burst_events_per_minute = lerp(5.0, 40.0, chaos);
        let brake_events_per_minute = lerp(3.0, 25.0, chaos);

        Self {
            noise_amplitude: lerp(0.02, 0.18, chaos),
            burst_events_per_minute,
            brake_events_per_minute,
            burst_probability: burst_events_per_minute / frames_per_minute,
            brake_probability: brake_events_per_minute / frames_per_minute,
            burst_magnitude: lerp(0.30, 2.50, chaos) * unit_rate,
            brake_magnitude: lerp(0.20, 1.80, chaos) * unit_rate,
            catch_up_max: lerp(0.20, 1.00, catch_up),
            catch_up_exponent: lerp(1.40, 0.85, catch_up),
            leader_penalty_max: lerp(0.00, 0.10, catch_up),
            endgame_tightening_max: lerp(0.00, 0.60, catch_up),
            unit_rate,
        }
    }

    pub fn for_config(config: &RaceConfig) -> Self {
        Self::resolve(config.chaos, config.catch_up, config.fps, config.total_frames())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn calm_sliders_hit_range_minimums() {
        let t = Tuning::resolve(0.0, 0.0, 60.0, 600);
        assert_relative_eq!(t.noise_amplitude, 0.02, epsilon = 1e-6);
        assert_relative_eq!(t.burst_events_per_minute, 5.0, epsilon = 1e-6);
        assert_relative_eq!(t.brake_events_per_minute, 3.0, epsilon = 1e-6);
        assert_relative_eq!(t.catch_up_max, 0.20, epsilon = 1e-6);
        assert_relative_eq!(t.catch_up_exponent, 1.40, epsilon = 1e-6);
        assert_relative_eq!(t.leader_penalty_max, 0.0, epsilon = 1e-6);
        assert_relative_eq!(t.endgame_tightening_max, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn wild_sliders_hit_range_maximums() {
        let t = Tuning::resolve(1.0, 1.0, 60.0, 600);
        assert_relative_eq!(t.noise_amplitude, 0.18, epsilon = 1e-6);
        assert_relative_eq!(t.burst_events_per_minute, 40.0, epsilon = 1e-6);
        assert_relative_eq!(t.brake_events_per_minute, 25.0, epsilon = 1e-6);
        assert_relative_eq!(t.catch_up_max, 1.0, epsilon = 1e-6);
        assert_relative_eq!(t.catch_up_exponent, 0.85, epsilon = 1e-6);
        assert_relative_eq!(t.leader_penalty_max, 0.10, epsilon = 1e-6);
        assert_relative_eq!(t.endgame_tightening_max, 0.60, epsilon = 1e-6);
    }

    #[test]
    fn probabilities_are_per_frame() {
        let t = Tuning::resolve(1.0, 0.5, 60.0, 600);
        assert_relative_eq!(t.burst_probability, 40.0 / 3600.0, epsilon = 1e-6);
        assert_relative_eq!(t.brake_probability, 25.0 / 3600.0, epsilon = 1e-6);
    }

    #[test]
    fn magnitudes_scale_with_unit_rate() {
        let t = Tuning::resolve(0.0, 0.0, 60.0, 1000);
        assert_relative_eq!(t.unit_rate, 0.1, epsilon = 1e-6);
        assert_relative_eq!(t.burst_magnitude, 0.03, epsilon = 1e-6);
        assert_relative_eq!(t.brake_magnitude, 0.02, epsilon = 1e-6);
    }
}
