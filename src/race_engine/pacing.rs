//! Pacing - Per-frame velocity composition
//!
//! Velocity for each entrant is built from the scheduled pack pace, scaled
//! by personality, wobble, catch-up, leader penalty and lead-phase favour,
//! then layered with burst/brake impulses and the endgame pull toward the
//! pack. The multiplicative part is divided by the pack mean, so bonuses
//! reorder the pack without changing its overall pace.
//!
//! The pack pace is re-derived every frame from the distance the median
//! still has to cover and the frames left on the schedule, which keeps
//! long races converging on their target duration.
//! All pack-wide aggregates come from a [`PackStats`] taken at the start of
//! the frame, so entrants can be paced in any order.

use serde::{Deserialize, Serialize};

use crate::race_engine::entrant::Entrant;
use crate::race_engine::injector::EventInjector;
use crate::race_engine::rng::RandomSource;
use crate::race_engine::tuning::Tuning;
use crate::race_engine::TRACK_LENGTH;

/// Pack-wide aggregates for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackStats {
    pub leader_x: f32,
    pub tail_x: f32,
    /// `leader_x - tail_x`, floored at [`PackStats::SPREAD_EPSILON`]
    pub spread: f32,
    pub median_x: f32,
}

impl PackStats {
    /// Spreads below this count as a dead heat
    pub const SPREAD_EPSILON: f32 = 0.1;

    pub fn from_entrants(entrants: &[Entrant]) -> Self {
        let mut positions: Vec<f32> = entrants.iter().map(|e| e.world_position).collect();
        Self::from_positions(&mut positions)
    }

    pub fn from_positions(positions: &mut [f32]) -> Self {
        if positions.is_empty() {
            return Self {
                leader_x: 0.0,
                tail_x: 0.0,
                spread: Self::SPREAD_EPSILON,
                median_x: 0.0,
            };
        }
        positions.sort_by(|a, b| a.total_cmp(b));

        let tail_x = positions[0];
        let leader_x = positions[positions.len() - 1];
        let mid = positions.len() / 2;
        let median_x = if positions.len() % 2 == 0 {
            (positions[mid - 1] + positions[mid]) * 0.5
        } else {
            positions[mid]
        };

        Self {
            leader_x,
            tail_x,
            spread: (leader_x - tail_x).max(Self::SPREAD_EPSILON),
            median_x,
        }
    }

    /// Normalized lag in `[0, 1]`; zero only for entrants level with
    /// the leader
    pub fn behind(&self, position: f32) -> f32 {
        ((self.leader_x - position) / self.spread).clamp(0.0, 1.0)
    }

    /// Within the front tenth of the spread
    pub fn is_leading(&self, position: f32) -> bool {
        (self.leader_x - position) < 0.1 * self.spread
    }

    /// Midpoint between leader and tail
    pub fn midpoint(&self) -> f32 {
        (self.leader_x + self.tail_x) * 0.5
    }
}

/// Everything the pacer needs besides the entrant itself
#[derive(Debug, Clone, Copy)]
pub struct PacingContext<'a> {
    pub pack: &'a PackStats,
    pub tuning: &'a Tuning,
    /// Mean velocity the pack should hold this frame
    pub pack_pace: f32,
    /// Entrant favoured by the active lead phase
    pub favored: Option<&'a str>,
}

/// Individual terms of one velocity computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaceBreakdown {
    pub base: f32,
    /// Personality times the summed multiplicative terms
    pub multiplier: f32,
    pub wobble: f32,
    pub catch_up: f32,
    pub leader_penalty: f32,
    pub phase_boost: f32,
    pub impulse: f32,
    pub tightening: f32,
    /// Final clamped velocity
    pub velocity: f32,
}

/// Pacing logic
pub struct Pacer;

impl Pacer {
    /// Constants
    const NOISE_STEP: f32 = 0.013;
    const NOISE_STEP_JITTER: f32 = 0.01;
    pub const PHASE_FAVOR_BOOST: f32 = 0.2;
    pub const ENDGAME_WINDOW: f32 = 25.0;
    const TIGHTENING_GAIN: f32 = 0.0009;
    pub const VELOCITY_FLOOR: f32 = 0.2;
    pub const VELOCITY_CEILING: f32 = 6.0;
    /// Bounds on the scheduled pack pace, in unit rates
    pub const PACE_FLOOR: f32 = 0.5;
    pub const PACE_CEILING: f32 = 3.0;

    /// Smooth wobble in `[-1, 1]` for a noise phase
    pub fn wobble(noise_phase: f32) -> f32 {
        ((2.1 * noise_phase).sin() + (1.3 * noise_phase).cos()) * 0.5
    }

    /// Pack pace that lands the median on the line when the schedule runs
    /// out. Past the schedule a single frame is treated as left.
    pub fn schedule_pace(median_x: f32, frame: u64, total_frames: u32, tuning: &Tuning) -> f32 {
        let frames_left = (total_frames as u64).saturating_sub(frame).max(1) as f32;
        let needed = (TRACK_LENGTH - median_x) / frames_left;
        needed.clamp(
            Self::PACE_FLOOR * tuning.unit_rate,
            Self::PACE_CEILING * tuning.unit_rate,
        )
    }

    /// Multiplicative boost for a normalized lag
    pub fn catch_up_boost(behind: f32, tuning: &Tuning) -> f32 {
        if behind <= 0.0 {
            return 0.0;
        }
        behind.min(1.0).powf(tuning.catch_up_exponent) * tuning.catch_up_max
    }

    /// Endgame pull strength for a given distance to the finish
    pub fn tightening_strength(distance_remaining: f32, tuning: &Tuning) -> f32 {
        if distance_remaining >= Self::ENDGAME_WINDOW {
            return 0.0;
        }
        tuning.endgame_tightening_max * (1.0 - distance_remaining / Self::ENDGAME_WINDOW)
    }

    /// First pass: advance the noise phase and compose the multiplicative
    /// terms. Leaves `velocity` unset.
    pub fn multiplier<R: RandomSource>(
        entrant: &mut Entrant,
        ctx: &PacingContext<'_>,
        rng: &mut R,
    ) -> PaceBreakdown {
        let tuning = ctx.tuning;
        let x = entrant.world_position;

        entrant.noise_phase += Self::NOISE_STEP + rng.uniform(0.0, Self::NOISE_STEP_JITTER);
        let wobble = Self::wobble(entrant.noise_phase) * tuning.noise_amplitude;

        let catch_up = Self::catch_up_boost(ctx.pack.behind(x), tuning);
        let leader_penalty = if ctx.pack.is_leading(x) {
            tuning.leader_penalty_max
        } else {
            0.0
        };
        let phase_boost = match ctx.favored {
            Some(id) if id == entrant.id => Self::PHASE_FAVOR_BOOST,
            _ => 0.0,
        };

        PaceBreakdown {
            base: ctx.pack_pace,
            multiplier: entrant.personality()
                * (1.0 + wobble + catch_up + phase_boost - leader_penalty),
            wobble,
            catch_up,
            leader_penalty,
            phase_boost,
            ..PaceBreakdown::default()
        }
    }

    /// Second pass: scale the base by the multiplier relative to the pack
    /// mean, then layer impulses and the endgame pull and clamp.
    pub fn apply<R: RandomSource>(
        entrant: &Entrant,
        mut pace: PaceBreakdown,
        pack_mean: f32,
        ctx: &PacingContext<'_>,
        rng: &mut R,
    ) -> PaceBreakdown {
        let tuning = ctx.tuning;
        let x = entrant.world_position;
        let pack_mean = if pack_mean > f32::EPSILON { pack_mean } else { 1.0 };

        let mut velocity = pace.base * pace.multiplier / pack_mean;

        pace.impulse = EventInjector::impulse(tuning, rng);
        velocity += pace.impulse;

        let strength = Self::tightening_strength((TRACK_LENGTH - x).max(0.0), tuning);
        if strength > 0.0 {
            pace.tightening = (ctx.pack.midpoint() - x) * Self::TIGHTENING_GAIN * strength;
            velocity += pace.tightening;
        }

        pace.velocity = Self::clamp_velocity(velocity, tuning);
        pace
    }

    /// Pace a single entrant on its own (pack mean taken as 1). Does not
    /// move the entrant.
    pub fn pace<R: RandomSource>(
        entrant: &mut Entrant,
        ctx: &PacingContext<'_>,
        rng: &mut R,
    ) -> PaceBreakdown {
        let pace = Self::multiplier(entrant, ctx, rng);
        Self::apply(entrant, pace, 1.0, ctx, rng)
    }

    /// Velocities for every unfinished entrant, normalized so the pack's
    /// mean multiplier is 1 and the pack holds `ctx.pack_pace`. Indices
    /// refer to `entrants`.
    pub fn pace_pack<R: RandomSource>(
        entrants: &mut [Entrant],
        ctx: &PacingContext<'_>,
        rng: &mut R,
    ) -> Vec<(usize, PaceBreakdown)> {
        let firsts: Vec<(usize, PaceBreakdown)> = entrants
            .iter_mut()
            .enumerate()
            .filter(|(_, e)| !e.finished)
            .map(|(i, e)| (i, Self::multiplier(e, ctx, rng)))
            .collect();
        if firsts.is_empty() {
            return firsts;
        }
        let pack_mean =
            firsts.iter().map(|(_, p)| p.multiplier).sum::<f32>() / firsts.len() as f32;

        firsts
            .into_iter()
            .map(|(i, pace)| (i, Self::apply(&entrants[i], pace, pack_mean, ctx, rng)))
            .collect()
    }

    /// Keep velocity between the stall floor and the teleport ceiling
    pub fn clamp_velocity(velocity: f32, tuning: &Tuning) -> f32 {
        let floor = Self::VELOCITY_FLOOR * tuning.unit_rate;
        let ceiling = Self::VELOCITY_CEILING * tuning.unit_rate;
        if velocity.is_nan() {
            return floor;
        }
        velocity.clamp(floor, ceiling)
    }
}
