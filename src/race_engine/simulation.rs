//! Simulation - Race engine and host-facing lifecycle
//!
//! Owns the active race and the random source, and provides the
//! start/tick/reset interface the host render loop calls into. The host
//! invokes [`RaceEngine::tick`] once per display frame; nothing here
//! registers callbacks or spawns work.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::race_engine::config::{EntrantSpec, RaceConfig};
use crate::race_engine::error::{RaceError, Result};
use crate::race_engine::events::RaceEvent;
use crate::race_engine::finish::RaceResult;
use crate::race_engine::race::{Race, RaceSnapshot, RaceStatus};
use crate::race_engine::rng::{RandomSource, SeededRandom};

/// Engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub fps: f32,
    pub avg_tick_time_ms: f32,
    pub entrant_count: u32,
    pub frame: u64,
    pub status: RaceStatus,
}

/// Main race engine
pub struct RaceEngine<R: RandomSource = SeededRandom> {
    /// Active race (if any)
    race: Option<Race>,
    rng: R,
    /// Recent tick durations for averaging
    tick_times: Vec<f32>,
}

impl RaceEngine<SeededRandom> {
    /// Engine with an entropy-seeded random source
    pub fn new() -> Self {
        Self::with_random(SeededRandom::from_entropy())
    }

    /// Engine with a reproducible random source
    pub fn with_seed(seed: u64) -> Self {
        Self::with_random(SeededRandom::new(seed))
    }
}

impl Default for RaceEngine<SeededRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> RaceEngine<R> {
    const TICK_WINDOW: usize = 60;

    pub fn with_random(rng: R) -> Self {
        Self {
            race: None,
            rng,
            tick_times: Vec::with_capacity(Self::TICK_WINDOW),
        }
    }

    /// Build a race from the roster and start its countdown. Only allowed
    /// from idle; on error nothing changes.
    pub fn start(&mut self, config: RaceConfig, roster: &[EntrantSpec]) -> Result<()> {
        let status = self.status();
        if status != RaceStatus::Idle {
            return Err(RaceError::RaceInProgress(status));
        }

        let mut race = Race::new(config, roster, &mut self.rng).map_err(|err| {
            log::warn!("Race refused to start: {err}");
            err
        })?;
        race.start_countdown();
        log::info!(
            "Countdown started: {} entrants, {:.1}s target",
            roster.len(),
            race.config.duration_seconds
        );

        self.race = Some(race);
        self.tick_times.clear();
        Ok(())
    }

    /// Skip whatever is left of the countdown
    pub fn begin_now(&mut self) {
        if let Some(race) = &mut self.race {
            race.begin(&mut self.rng);
        }
    }

    /// Advance by one host frame. During the countdown `delta` (seconds)
    /// drains the timer; while running each call is one simulation frame.
    pub fn tick(&mut self, delta: f32) -> Option<RaceSnapshot> {
        let tick_start = Instant::now();

        let race = self.race.as_mut()?;
        race.update(delta, &mut self.rng);

        // Record tick time
        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > Self::TICK_WINDOW {
            self.tick_times.remove(0);
        }

        self.race.as_ref().map(|r| r.get_snapshot())
    }

    /// Simulate one racing frame directly, bypassing timing
    pub fn step_frame(&mut self) -> Option<RaceSnapshot> {
        let race = self.race.as_mut()?;
        race.step_frame(&mut self.rng);
        Some(race.get_snapshot())
    }

    /// Run frames until the race finishes, returning the frame count
    pub fn run_to_finish(&mut self) -> Option<u64> {
        self.begin_now();
        let race = self.race.as_mut()?;
        while race.status == RaceStatus::Running {
            race.step_frame(&mut self.rng);
        }
        Some(race.frame)
    }

    /// Get current race snapshot
    pub fn snapshot(&self) -> Option<RaceSnapshot> {
        self.race.as_ref().map(|r| r.get_snapshot())
    }

    /// Final ranking, finishers first
    pub fn results(&self) -> Option<Vec<RaceResult>> {
        self.race.as_ref().map(|r| r.results())
    }

    pub fn podium(&self) -> Option<Vec<String>> {
        self.race.as_ref().map(|r| r.podium())
    }

    pub fn winner(&self) -> Option<&str> {
        self.race.as_ref().and_then(|r| r.winner())
    }

    /// Read-only access to the full race state between ticks
    pub fn race(&self) -> Option<&Race> {
        self.race.as_ref()
    }

    pub fn status(&self) -> RaceStatus {
        self.race
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(RaceStatus::Idle)
    }

    /// Notifications queued since the last drain
    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        self.race
            .as_mut()
            .map(|r| r.drain_events())
            .unwrap_or_default()
    }

    /// Get engine statistics
    pub fn stats(&self) -> EngineStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        EngineStats {
            fps: self.race.as_ref().map(|r| r.config.fps).unwrap_or(0.0),
            avg_tick_time_ms: avg_tick_time,
            entrant_count: self
                .race
                .as_ref()
                .map(|r| r.entrants.len() as u32)
                .unwrap_or(0),
            frame: self.race.as_ref().map(|r| r.frame).unwrap_or(0),
            status: self.status(),
        }
    }

    /// Drop the race and return to idle
    pub fn reset(&mut self) {
        if self.race.take().is_some() {
            log::info!("Race reset");
        }
        self.tick_times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_engine::config::default_roster;

    fn config() -> RaceConfig {
        RaceConfig {
            duration_seconds: 10.0,
            countdown_seconds: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn start_requires_two_entrants() {
        let mut engine = RaceEngine::with_seed(1);
        let err = engine.start(config(), &default_roster(1)).unwrap_err();
        assert_eq!(err, RaceError::NotEnoughEntrants { found: 1 });
        assert_eq!(engine.status(), RaceStatus::Idle);
        assert!(engine.snapshot().is_none());
        assert!(engine.tick(1.0 / 60.0).is_none());
    }

    #[test]
    fn cannot_start_twice() {
        let mut engine = RaceEngine::with_seed(2);
        engine.start(config(), &default_roster(3)).unwrap();
        let err = engine.start(config(), &default_roster(3)).unwrap_err();
        assert_eq!(err, RaceError::RaceInProgress(RaceStatus::Countdown));
    }

    #[test]
    fn lifecycle_walks_every_state() {
        let mut engine = RaceEngine::with_seed(3);
        assert_eq!(engine.status(), RaceStatus::Idle);

        engine.start(config(), &default_roster(4)).unwrap();
        assert_eq!(engine.status(), RaceStatus::Countdown);

        while engine.status() == RaceStatus::Countdown {
            engine.tick(1.0 / 60.0);
        }
        assert_eq!(engine.status(), RaceStatus::Running);

        while engine.status() == RaceStatus::Running {
            engine.tick(1.0 / 60.0);
        }
        assert_eq!(engine.status(), RaceStatus::Finished);
        assert!(engine.winner().is_some());

        let names: Vec<&str> = engine.drain_events().iter().map(|e| e.name()).collect();
        assert_eq!(names.first(), Some(&"race-countdown-started"));
        assert!(names.contains(&"race-begin"));
        assert_eq!(names.last(), Some(&"race-finished"));

        engine.reset();
        assert_eq!(engine.status(), RaceStatus::Idle);
        assert!(engine.winner().is_none());
        engine.start(config(), &default_roster(2)).unwrap();
    }

    #[test]
    fn finished_race_must_be_reset_before_restart() {
        let mut engine = RaceEngine::with_seed(4);
        engine.start(config(), &default_roster(2)).unwrap();
        engine.run_to_finish();
        assert_eq!(
            engine.start(config(), &default_roster(2)).unwrap_err(),
            RaceError::RaceInProgress(RaceStatus::Finished)
        );
    }

    #[test]
    fn stats_track_the_active_race() {
        let mut engine = RaceEngine::with_seed(5);
        engine.start(config(), &default_roster(6)).unwrap();
        engine.begin_now();
        for _ in 0..10 {
            engine.tick(1.0 / 60.0);
        }
        let stats = engine.stats();
        assert_eq!(stats.entrant_count, 6);
        assert_eq!(stats.frame, 10);
        assert_eq!(stats.status, RaceStatus::Running);
        assert!(stats.avg_tick_time_ms >= 0.0);
    }
}
