//! Entrant - Per-race state for a single racer
//!
//! Each entrant carries its world position, last velocity, fixed
//! personality draws and finish data. The race owns every entrant
//! exclusively; they are rebuilt from the roster on each start.

use serde::{Deserialize, Serialize};

use crate::race_engine::camera::{CameraState, Viewport};
use crate::race_engine::config::{EntrantSpec, MotionStyle};
use crate::race_engine::rng::RandomSource;

/// Complete state for a single entrant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entrant {
    /// Unique entrant ID
    pub id: String,
    /// Name shown on the nameplate
    pub display_name: String,
    /// Cosmetic motion tag
    pub motion: MotionStyle,
    /// Distance along the track (world units, finish at 100)
    pub world_position: f32,
    /// Position at the start of the current frame
    pub previous_position: f32,
    /// Last computed velocity (world units/frame)
    pub world_velocity: f32,
    /// Innate pace multiplier
    pub talent: f32,
    /// Day-of-race form multiplier
    pub skill: f32,
    /// Drives the smooth wobble, only ever increases
    pub noise_phase: f32,
    pub finished: bool,
    /// 1-based finish rank, `None` while racing
    pub finish_order: Option<u32>,
}

impl Entrant {
    pub const TALENT_RANGE: (f32, f32) = (0.92, 1.08);
    pub const SKILL_RANGE: (f32, f32) = (0.94, 1.06);
    const NOISE_PHASE_SPAN: f32 = 1000.0;

    /// Create an entrant at the start line with fresh personality draws
    pub fn from_spec<R: RandomSource>(spec: &EntrantSpec, rng: &mut R) -> Self {
        Self {
            id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            motion: spec.motion,
            world_position: 0.0,
            previous_position: 0.0,
            world_velocity: 0.0,
            talent: rng.uniform(Self::TALENT_RANGE.0, Self::TALENT_RANGE.1),
            skill: rng.uniform(Self::SKILL_RANGE.0, Self::SKILL_RANGE.1),
            noise_phase: rng.uniform(0.0, Self::NOISE_PHASE_SPAN),
            finished: false,
            finish_order: None,
        }
    }

    /// Entrant with neutral personality, placed at `position`
    pub fn neutral(id: impl Into<String>, position: f32) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            motion: MotionStyle::default(),
            world_position: position,
            previous_position: position,
            world_velocity: 0.0,
            talent: 1.0,
            skill: 1.0,
            noise_phase: 0.0,
            finished: false,
            finish_order: None,
        }
    }

    /// Combined fixed personality multiplier
    pub fn personality(&self) -> f32 {
        self.talent * self.skill
    }

    /// Distance left to the finish line
    pub fn distance_remaining(&self) -> f32 {
        (crate::race_engine::TRACK_LENGTH - self.world_position).max(0.0)
    }

    /// Move forward by `velocity`, remembering where the frame started
    pub fn advance(&mut self, velocity: f32) {
        self.previous_position = self.world_position;
        self.world_velocity = velocity;
        self.world_position += velocity;
    }

    /// Nudge off the line without counting as a frame of motion
    pub fn hole_shot(&mut self, offset: f32) {
        self.world_position += offset;
        self.previous_position = self.world_position;
    }

    pub fn mark_finished(&mut self, order: u32) {
        self.finished = true;
        self.finish_order = Some(order);
    }

    /// Render-facing view of this entrant
    pub fn snapshot(&self, camera: &CameraState, viewport: &Viewport) -> EntrantSnapshot {
        EntrantSnapshot {
            id: self.id.clone(),
            screen_x: viewport.screen_x(self.world_position, camera),
            world_position: self.world_position,
            motion: self.motion,
            finished: self.finished,
            finish_order: self.finish_order,
        }
    }
}

/// Compact entrant state for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantSnapshot {
    pub id: String,
    pub screen_x: f32,
    pub world_position: f32,
    pub motion: MotionStyle,
    pub finished: bool,
    pub finish_order: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_engine::rng::SeededRandom;

    #[test]
    fn personality_draws_stay_near_one() {
        let mut rng = SeededRandom::new(11);
        for i in 0..200 {
            let spec = EntrantSpec::new(format!("e{i}"), "E");
            let e = Entrant::from_spec(&spec, &mut rng);
            assert!(e.talent >= Entrant::TALENT_RANGE.0 && e.talent < Entrant::TALENT_RANGE.1);
            assert!(e.skill >= Entrant::SKILL_RANGE.0 && e.skill < Entrant::SKILL_RANGE.1);
            assert_eq!(e.world_position, 0.0);
            assert!(!e.finished);
        }
    }

    #[test]
    fn advance_tracks_previous_position() {
        let mut e = Entrant::neutral("a", 10.0);
        e.advance(0.5);
        assert_eq!(e.previous_position, 10.0);
        assert_eq!(e.world_position, 10.5);
        assert_eq!(e.world_velocity, 0.5);
    }

    #[test]
    fn hole_shot_does_not_register_as_motion() {
        let mut e = Entrant::neutral("a", 0.0);
        e.hole_shot(0.3);
        assert_eq!(e.previous_position, e.world_position);
    }
}
