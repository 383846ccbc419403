//! Error types for the race engine.

use thiserror::Error;

use crate::race_engine::race::RaceStatus;

/// Result type alias using [`RaceError`].
pub type Result<T> = std::result::Result<T, RaceError>;

/// Reasons a race refuses to start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaceError {
    /// Fewer than two entrants on the roster.
    #[error("not enough entrants: need at least 2, got {found}")]
    NotEnoughEntrants {
        /// Roster size that was supplied.
        found: usize,
    },

    /// Two roster entries share an id.
    #[error("duplicate entrant id: {0}")]
    DuplicateEntrant(String),

    /// A race is already counting down, running or awaiting reset.
    #[error("race already in progress ({0:?}); reset first")]
    RaceInProgress(RaceStatus),
}
