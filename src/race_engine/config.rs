//! Config - Race configuration and roster entries
//!
//! Values arrive from the settings collaborator. [`RaceConfig::sanitized`]
//! is that collaborator's clamp; the engine itself trusts what it is given.

use serde::{Deserialize, Serialize};

/// Race configuration, immutable for the lifetime of one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Target race length in seconds
    pub duration_seconds: f32,
    /// Noise amplitude and burst/brake frequency (0..1)
    pub chaos: f32,
    /// Catch-up assist strength (0..1)
    pub catch_up: f32,
    /// Fraction of the track width kept clear past the finish line
    pub finish_fraction: f32,
    /// Number of engineered lead phases, `None` disables them
    pub lead_phase_count: Option<u32>,
    /// Display frames per second the host ticks at
    pub fps: f32,
    /// Real-time countdown before the start
    pub countdown_seconds: f32,
    /// Frames allowed past the schedule before a forced stop
    pub overtime_frames: u32,
    /// Track width in pixels for the screen mapping
    pub track_width: f32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 35.0,
            chaos: 0.6,
            catch_up: 0.7,
            finish_fraction: 0.12,
            lead_phase_count: Some(3),
            fps: 60.0,
            countdown_seconds: 3.0,
            overtime_frames: 240,
            track_width: 1280.0,
        }
    }
}

impl RaceConfig {
    pub const MIN_DURATION: f32 = 5.0;
    pub const MAX_DURATION: f32 = 600.0;
    pub const MIN_FINISH_FRACTION: f32 = 0.02;
    pub const MAX_FINISH_FRACTION: f32 = 0.30;
    pub const MAX_LEAD_PHASES: u32 = 10;

    /// Clamp every field into its valid range; non-finite values fall back
    /// to the default.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let pick = |value: f32, fallback: f32, min: f32, max: f32| {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                fallback
            }
        };

        Self {
            duration_seconds: pick(
                self.duration_seconds,
                defaults.duration_seconds,
                Self::MIN_DURATION,
                Self::MAX_DURATION,
            ),
            chaos: pick(self.chaos, defaults.chaos, 0.0, 1.0),
            catch_up: pick(self.catch_up, defaults.catch_up, 0.0, 1.0),
            finish_fraction: pick(
                self.finish_fraction,
                defaults.finish_fraction,
                Self::MIN_FINISH_FRACTION,
                Self::MAX_FINISH_FRACTION,
            ),
            lead_phase_count: self
                .lead_phase_count
                .map(|k| k.clamp(1, Self::MAX_LEAD_PHASES)),
            fps: pick(self.fps, defaults.fps, 1.0, 240.0),
            countdown_seconds: pick(self.countdown_seconds, defaults.countdown_seconds, 0.0, 10.0),
            overtime_frames: self.overtime_frames,
            track_width: pick(self.track_width, defaults.track_width, 100.0, 16_384.0),
        }
    }

    /// Scheduled frame count, never zero
    pub fn total_frames(&self) -> u32 {
        (self.duration_seconds * self.fps).round().max(1.0) as u32
    }

    /// World units per frame needed to finish exactly on schedule
    pub fn unit_rate(&self) -> f32 {
        crate::race_engine::TRACK_LENGTH / self.total_frames() as f32
    }
}

/// Cosmetic motion tag carried through to the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionStyle {
    #[default]
    Roll,
    Floaty,
    Wheelie,
}

/// One roster entry supplied by the roster collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantSpec {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub motion: MotionStyle,
}

impl EntrantSpec {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            motion: MotionStyle::default(),
        }
    }

    pub fn with_motion(mut self, motion: MotionStyle) -> Self {
        self.motion = motion;
        self
    }
}

/// Generate a default roster of `count` players named "Player N"
pub fn default_roster(count: usize) -> Vec<EntrantSpec> {
    const STYLES: [MotionStyle; 3] = [MotionStyle::Roll, MotionStyle::Floaty, MotionStyle::Wheelie];
    (0..count)
        .map(|i| {
            EntrantSpec::new(format!("p{}", i + 1), format!("Player {}", i + 1))
                .with_motion(STYLES[i % STYLES.len()])
        })
        .collect()
}
