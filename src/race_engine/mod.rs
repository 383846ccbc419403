//! Race Engine Module
//!
//! Frame-driven pacing, camera and finish resolution for a multi-entrant
//! race. The host render loop owns a [`RaceEngine`] and calls `tick` once
//! per display frame.

pub mod camera;
pub mod config;
pub mod entrant;
pub mod error;
pub mod events;
pub mod finish;
pub mod injector;
pub mod pacing;
pub mod phases;
pub mod race;
pub mod rng;
pub mod simulation;
pub mod tuning;

/// Track length in world units; the finish line sits here
pub const TRACK_LENGTH: f32 = 100.0;

pub use camera::{CameraState, Viewport};
pub use config::{default_roster, EntrantSpec, MotionStyle, RaceConfig};
pub use entrant::{Entrant, EntrantSnapshot};
pub use error::RaceError;
pub use events::RaceEvent;
pub use finish::{FinishLedger, RaceResult, StopReason};
pub use phases::{Phase, PhasePlan};
pub use race::{Race, RaceSnapshot, RaceStatus};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use simulation::{EngineStats, RaceEngine};
pub use tuning::Tuning;
