//! Race - Race state and the per-frame update
//!
//! Handles race setup, the countdown, frame stepping and finish handling.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::race_engine::camera::{CameraState, Viewport};
use crate::race_engine::config::{EntrantSpec, RaceConfig};
use crate::race_engine::entrant::{Entrant, EntrantSnapshot};
use crate::race_engine::error::{RaceError, Result};
use crate::race_engine::events::RaceEvent;
use crate::race_engine::finish::{self, FinishLedger, RaceResult, StopReason};
use crate::race_engine::pacing::{PackStats, Pacer, PacingContext};
use crate::race_engine::phases::PhasePlan;
use crate::race_engine::rng::RandomSource;
use crate::race_engine::tuning::Tuning;

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Idle,
    Countdown,
    Running,
    Finished,
}

/// Complete race state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    /// Race configuration
    pub config: RaceConfig,
    /// Coefficients resolved from the config
    pub tuning: Tuning,
    /// Current race status
    pub status: RaceStatus,
    /// All entrants in the race
    pub entrants: Vec<Entrant>,
    pub camera: CameraState,
    pub viewport: Viewport,
    /// Winner and finish count
    pub ledger: FinishLedger,
    pub phases: PhasePlan,
    /// Racing frames simulated so far
    pub frame: u64,
    /// Countdown remaining (seconds)
    pub countdown: f32,
    /// Entrant currently furthest along (the winner once declared)
    pub leader_id: Option<String>,
    pub stop_reason: Option<StopReason>,
    #[serde(skip)]
    events: Vec<RaceEvent>,
}

impl Race {
    /// Hole-shot jitter applied to everyone at the start
    const HOLE_SHOT_MAX: f32 = 0.5;

    /// Build a race from a roster. Fails without touching anything when
    /// the roster is too small or has duplicate ids.
    pub fn new<R: RandomSource>(
        config: RaceConfig,
        roster: &[EntrantSpec],
        rng: &mut R,
    ) -> Result<Self> {
        if roster.len() < 2 {
            return Err(RaceError::NotEnoughEntrants {
                found: roster.len(),
            });
        }
        let mut seen = HashSet::with_capacity(roster.len());
        for spec in roster {
            if !seen.insert(spec.id.as_str()) {
                return Err(RaceError::DuplicateEntrant(spec.id.clone()));
            }
        }

        let tuning = Tuning::for_config(&config);
        let total_frames = config.total_frames();
        let entrants: Vec<Entrant> = roster
            .iter()
            .map(|spec| Entrant::from_spec(spec, rng))
            .collect();
        let ids: Vec<String> = entrants.iter().map(|e| e.id.clone()).collect();
        let phases = match config.lead_phase_count {
            Some(k) => PhasePlan::plan(&ids, total_frames, k, rng),
            None => PhasePlan::neutral(total_frames),
        };

        Ok(Self {
            viewport: Viewport::for_track(config.track_width, config.finish_fraction),
            camera: CameraState::primed(tuning.unit_rate),
            config,
            tuning,
            status: RaceStatus::Idle,
            entrants,
            ledger: FinishLedger::default(),
            phases,
            frame: 0,
            countdown: 0.0,
            leader_id: None,
            stop_reason: None,
            events: Vec::new(),
        })
    }

    /// Start countdown
    pub fn start_countdown(&mut self) {
        self.status = RaceStatus::Countdown;
        self.countdown = self.config.countdown_seconds;
        self.events.push(RaceEvent::CountdownStarted {
            seconds: self.countdown,
        });
    }

    /// Update race state for one host tick
    pub fn update<R: RandomSource>(&mut self, delta: f32, rng: &mut R) {
        match self.status {
            RaceStatus::Idle | RaceStatus::Finished => {}

            RaceStatus::Countdown => {
                self.countdown -= delta;
                if self.countdown <= 0.0 {
                    self.begin(rng);
                }
            }

            RaceStatus::Running => self.step_frame(rng),
        }
    }

    /// Leave the grid: jitter everyone off the line and start racing
    pub fn begin<R: RandomSource>(&mut self, rng: &mut R) {
        if !matches!(self.status, RaceStatus::Idle | RaceStatus::Countdown) {
            return;
        }
        for entrant in &mut self.entrants {
            entrant.hole_shot(rng.uniform(0.0, Self::HOLE_SHOT_MAX));
        }
        self.status = RaceStatus::Running;
        self.countdown = 0.0;
        self.events.push(RaceEvent::RaceBegin {
            entrant_count: self.entrants.len(),
            total_frames: self.config.total_frames(),
        });
        log::info!(
            "Race begins: {} entrants over {} frames",
            self.entrants.len(),
            self.config.total_frames()
        );
        self.track_leader();
    }

    /// Simulate one racing frame
    pub fn step_frame<R: RandomSource>(&mut self, rng: &mut R) {
        if self.status != RaceStatus::Running {
            return;
        }

        let pack = PackStats::from_entrants(&self.entrants);
        let pack_pace = Pacer::schedule_pace(
            pack.median_x,
            self.frame,
            self.config.total_frames(),
            &self.tuning,
        );
        self.camera.follow(pack_pace, pack.median_x);

        let phase_frame = u32::try_from(self.frame).unwrap_or(u32::MAX);
        let ctx = PacingContext {
            pack: &pack,
            tuning: &self.tuning,
            pack_pace,
            favored: self.phases.favored_at(phase_frame),
        };
        for (index, pace) in Pacer::pace_pack(&mut self.entrants, &ctx, rng) {
            self.entrants[index].advance(pace.velocity);
        }
        self.frame += 1;
        log::trace!(
            "frame {}: leader {:.2} tail {:.2} pace {:.4} camera {:.2}",
            self.frame,
            pack.leader_x,
            pack.tail_x,
            pack_pace,
            self.camera.position
        );

        self.ledger.resolve(&mut self.entrants);
        self.track_leader();

        if let Some(reason) = self.ledger.stop_reason(
            self.entrants.len(),
            self.frame,
            self.config.total_frames(),
            self.config.overtime_frames,
        ) {
            self.finish(reason);
        }
    }

    fn finish(&mut self, reason: StopReason) {
        if reason == StopReason::ForcedStop {
            log::warn!("No entrant crossed before overtime; forcing a winner");
            self.ledger.force_winner(&mut self.entrants);
        }
        for entrant in &mut self.entrants {
            entrant.world_velocity = 0.0;
        }
        self.camera.velocity = 0.0;
        self.status = RaceStatus::Finished;
        self.stop_reason = Some(reason);
        self.track_leader();

        let Some(winner_id) = self.ledger.winner.clone() else {
            return;
        };
        let finish_orders: BTreeMap<String, u32> = self
            .entrants
            .iter()
            .filter_map(|e| e.finish_order.map(|order| (e.id.clone(), order)))
            .collect();
        log::info!(
            "Race finished at frame {} ({:?}): winner {}",
            self.frame,
            reason,
            winner_id
        );
        self.events.push(RaceEvent::RaceFinished {
            winner_id,
            podium: self.podium(),
            finish_orders,
        });
    }

    /// Follow the front of the pack, emitting an event whenever it changes
    fn track_leader(&mut self) {
        let next = match &self.ledger.winner {
            Some(winner) => Some(winner.clone()),
            None => {
                let current = self
                    .leader_id
                    .as_deref()
                    .and_then(|id| self.entrant(id))
                    .map(|e| e.world_position);
                let front = self
                    .entrants
                    .iter()
                    .max_by(|a, b| a.world_position.total_cmp(&b.world_position));
                match (front, current) {
                    // ties keep the incumbent so the lead doesn't flicker
                    (Some(front), Some(pos)) if pos >= front.world_position => {
                        self.leader_id.clone()
                    }
                    (Some(front), _) => Some(front.id.clone()),
                    (None, _) => None,
                }
            }
        };

        if next != self.leader_id {
            if let Some(new_leader_id) = next.clone() {
                log::debug!("Lead change: {:?} -> {}", self.leader_id, new_leader_id);
                self.events.push(RaceEvent::LeaderChanged {
                    previous_leader_id: self.leader_id.clone(),
                    new_leader_id,
                });
            }
            self.leader_id = next;
        }
    }

    /// Winner first, then the best of the rest, at most three
    pub fn podium(&self) -> Vec<String> {
        finish::standings(&self.entrants)
            .into_iter()
            .take(FinishLedger::PODIUM_SIZE.min(self.entrants.len()))
            .map(|e| e.id.clone())
            .collect()
    }

    pub fn results(&self) -> Vec<RaceResult> {
        finish::results(&self.entrants)
    }

    pub fn winner(&self) -> Option<&str> {
        self.ledger.winner.as_deref()
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seconds left on the schedule
    pub fn time_remaining(&self) -> f32 {
        match self.status {
            RaceStatus::Idle | RaceStatus::Countdown => self.config.duration_seconds,
            _ => {
                let left = self.config.total_frames() as f32 - self.frame as f32;
                (left / self.config.fps).max(0.0)
            }
        }
    }

    /// Get compact snapshot for the renderer
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            frame: self.frame,
            countdown: self.countdown.max(0.0),
            camera_position: self.camera.position,
            camera_offset: self.camera.position * self.viewport.scale(),
            entrants: self
                .entrants
                .iter()
                .map(|e| e.snapshot(&self.camera, &self.viewport))
                .collect(),
            leader_id: self.leader_id.clone(),
            winner_id: self.ledger.winner.clone(),
            time_remaining_seconds: self.time_remaining(),
            finisher_count: self.ledger.finished_count,
        }
    }

    /// Get current leader
    pub fn leader(&self) -> Option<&Entrant> {
        self.leader_id.as_deref().and_then(|id| self.entrant(id))
    }

    /// Get entrant by ID
    pub fn entrant(&self, id: &str) -> Option<&Entrant> {
        self.entrants.iter().find(|e| e.id == id)
    }
}

/// Immutable per-frame view for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub frame: u64,
    /// Readiness indicator during the countdown
    pub countdown: f32,
    pub camera_position: f32,
    /// Camera position in pixels, for background layers
    pub camera_offset: f32,
    pub entrants: Vec<EntrantSnapshot>,
    pub leader_id: Option<String>,
    pub winner_id: Option<String>,
    pub time_remaining_seconds: f32,
    pub finisher_count: u32,
}
