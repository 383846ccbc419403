//! Camera - Virtual viewpoint that keeps the pack framed
//!
//! The camera moves at the scheduled pace plus a gentle proportional pull
//! toward the pack median. [`Viewport`] maps world positions to screen
//! pixels relative to the camera.

use serde::{Deserialize, Serialize};

use crate::race_engine::TRACK_LENGTH;

/// Camera state for one race
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// World position of the viewpoint
    pub position: f32,
    /// Last applied velocity (world units/frame)
    pub velocity: f32,
    /// Frames the camera has moved
    pub frame_counter: u64,
}

impl CameraState {
    pub const FOLLOW_GAIN: f32 = 0.015;

    /// Camera at the start line, already showing the on-schedule pace
    pub fn primed(base_velocity: f32) -> Self {
        Self {
            velocity: base_velocity,
            ..Self::default()
        }
    }

    /// Advance one racing frame toward the pack median
    pub fn follow(&mut self, base_velocity: f32, median_position: f32) {
        self.velocity = base_velocity + (median_position - self.position) * Self::FOLLOW_GAIN;
        self.position += self.velocity;
        self.frame_counter += 1;
    }
}

/// World-to-screen mapping for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pixel distance covering the full track
    pub finish_pixel: f32,
    /// Screen x where the camera position lands
    pub center_offset: f32,
}

impl Viewport {
    /// Viewport for a track `width` pixels wide with `finish_fraction`
    /// of it kept clear past the finish line
    pub fn for_track(width: f32, finish_fraction: f32) -> Self {
        Self {
            finish_pixel: width * (1.0 - finish_fraction),
            center_offset: width * 0.5,
        }
    }

    /// Pixels per world unit
    pub fn scale(&self) -> f32 {
        self.finish_pixel / TRACK_LENGTH
    }

    pub fn screen_x(&self, world_position: f32, camera: &CameraState) -> f32 {
        (world_position - camera.position) * self.scale() + self.center_offset
    }

    /// Scroll offset for a decorative layer moving at `factor` of the
    /// camera; purely cosmetic
    pub fn parallax_offset(&self, camera: &CameraState, factor: f32) -> f32 {
        camera.position * self.scale() * factor
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::for_track(1280.0, 0.12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn follow_pulls_toward_median() {
        let mut camera = CameraState::default();
        camera.follow(0.1, 10.0);
        assert_relative_eq!(camera.velocity, 0.1 + 10.0 * 0.015, epsilon = 1e-6);
        assert_relative_eq!(camera.position, camera.velocity, epsilon = 1e-6);
        assert_eq!(camera.frame_counter, 1);
    }

    #[test]
    fn follow_slows_when_ahead_of_pack() {
        let mut camera = CameraState {
            position: 20.0,
            ..Default::default()
        };
        camera.follow(0.1, 10.0);
        assert!(camera.velocity < 0.1);
    }

    #[test]
    fn camera_position_maps_to_center() {
        let viewport = Viewport::for_track(1000.0, 0.2);
        let camera = CameraState {
            position: 42.0,
            ..Default::default()
        };
        assert_relative_eq!(viewport.screen_x(42.0, &camera), 500.0, epsilon = 1e-4);
        assert_relative_eq!(viewport.scale(), 8.0, epsilon = 1e-6);
        assert_relative_eq!(viewport.screen_x(52.0, &camera), 580.0, epsilon = 1e-4);
    }

    #[test]
    fn parallax_layers_scroll_slower() {
        let viewport = Viewport::for_track(1000.0, 0.2);
        let camera = CameraState {
            position: 10.0,
            ..Default::default()
        };
        let near = viewport.parallax_offset(&camera, 1.0);
        let far = viewport.parallax_offset(&camera, 0.4);
        assert!(far < near);
        assert_relative_eq!(near, 80.0, epsilon = 1e-4);
    }
}
