//! Grand Prix - Race pacing engine
//!
//! Animates a giveaway "race" that converges on a target duration while
//! biasing toward lead changes and close finishes. Rendering, rosters and
//! settings forms live with the host; this crate supplies the per-frame
//! state they draw.

pub mod race_engine;

pub use race_engine::{
    default_roster, EntrantSpec, MotionStyle, RaceConfig, RaceEngine, RaceError, RaceEvent,
    RaceResult, RaceSnapshot, RaceStatus, RandomSource, ScriptedRandom, SeededRandom,
};
