//! Finish - Line-crossing detection, ranking and the stop condition
//!
//! Crossings within one frame are ordered by where inside the frame each
//! entrant actually reached the line, so simultaneous arrivals never
//! depend on roster order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::race_engine::entrant::Entrant;
use crate::race_engine::TRACK_LENGTH;

/// One entrant reaching the line during a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    /// Index into the entrant list
    pub index: usize,
    pub id: String,
    /// Fraction of the frame elapsed when the line was reached
    pub fraction: f32,
    pub position: f32,
}

impl Crossing {
    fn order(&self, other: &Self) -> Ordering {
        self.fraction
            .total_cmp(&other.fraction)
            .then_with(|| other.position.total_cmp(&self.position))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Why a race stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Winner declared and enough finishers for a podium
    PodiumFilled,
    /// Winner declared but the overtime cap ran out
    Overtime,
    /// Nobody crossed before the overtime cap
    ForcedStop,
}

/// Winner and running finish count for one race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishLedger {
    /// Set once, by the first resolved crossing
    pub winner: Option<String>,
    pub finished_count: u32,
}

impl FinishLedger {
    /// Finishers needed before the race may stop
    pub const PODIUM_SIZE: usize = 3;

    /// Where in the frame the line was reached, `0.0..=1.0`
    pub fn crossing_fraction(previous: f32, current: f32) -> f32 {
        ((TRACK_LENGTH - previous) / (current - previous).max(1e-6)).clamp(0.0, 1.0)
    }

    /// Entrants that went from short of the line to on/over it this frame,
    /// earliest true crossing first
    pub fn detect(entrants: &[Entrant]) -> Vec<Crossing> {
        let mut crossings: Vec<Crossing> = entrants
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                !e.finished
                    && e.previous_position < TRACK_LENGTH
                    && e.world_position >= TRACK_LENGTH
            })
            .map(|(index, e)| Crossing {
                index,
                id: e.id.clone(),
                fraction: Self::crossing_fraction(e.previous_position, e.world_position),
                position: e.world_position,
            })
            .collect();
        crossings.sort_by(Crossing::order);
        crossings
    }

    /// Detect this frame's crossings and assign finish orders. Returns the
    /// crossings in the order they were ranked.
    pub fn resolve(&mut self, entrants: &mut [Entrant]) -> Vec<Crossing> {
        let crossings = Self::detect(entrants);
        for crossing in &crossings {
            self.finished_count += 1;
            entrants[crossing.index].mark_finished(self.finished_count);
            if self.winner.is_none() {
                log::debug!("{} crosses first", crossing.id);
                self.winner = Some(crossing.id.clone());
            }
        }
        crossings
    }

    /// Stop check run after every frame
    pub fn stop_reason(
        &self,
        entrant_count: usize,
        frame: u64,
        total_frames: u32,
        overtime_frames: u32,
    ) -> Option<StopReason> {
        let out_of_time = frame >= total_frames as u64 + overtime_frames as u64;
        match &self.winner {
            Some(_) if self.finished_count as usize >= entrant_count.min(Self::PODIUM_SIZE) => {
                Some(StopReason::PodiumFilled)
            }
            Some(_) if out_of_time => Some(StopReason::Overtime),
            None if out_of_time => Some(StopReason::ForcedStop),
            _ => None,
        }
    }

    /// Declare whoever is furthest along the winner when nobody crossed
    pub fn force_winner(&mut self, entrants: &mut [Entrant]) {
        if self.winner.is_some() {
            return;
        }
        let furthest = entrants
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.world_position
                    .total_cmp(&b.world_position)
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|(i, _)| i);
        if let Some(index) = furthest {
            self.finished_count += 1;
            entrants[index].mark_finished(self.finished_count);
            self.winner = Some(entrants[index].id.clone());
        }
    }
}

/// Finish ranking: finishers by finish order, then everyone else by
/// position (furthest first)
pub fn standings(entrants: &[Entrant]) -> Vec<&Entrant> {
    let mut ranked: Vec<&Entrant> = entrants.iter().collect();
    ranked.sort_by(|a, b| match (a.finish_order, b.finish_order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b
            .world_position
            .total_cmp(&a.world_position)
            .then_with(|| a.id.cmp(&b.id)),
    });
    ranked
}

/// Final placing for one entrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub entrant_id: String,
    pub display_name: String,
    /// 1-based place in the final ranking
    pub position: u32,
    /// Set only for entrants that crossed the line
    pub finish_order: Option<u32>,
    pub world_position: f32,
}

pub fn results(entrants: &[Entrant]) -> Vec<RaceResult> {
    standings(entrants)
        .into_iter()
        .enumerate()
        .map(|(i, e)| RaceResult {
            entrant_id: e.id.clone(),
            display_name: e.display_name.clone(),
            position: i as u32 + 1,
            finish_order: e.finish_order,
            world_position: e.world_position,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving(id: &str, from: f32, to: f32) -> Entrant {
        let mut e = Entrant::neutral(id, from);
        e.advance(to - from);
        e
    }

    #[test]
    fn fraction_back_solves_within_frame() {
        assert!((FinishLedger::crossing_fraction(99.0, 101.0) - 0.5).abs() < 1e-6);
        assert!((FinishLedger::crossing_fraction(99.5, 100.5) - 0.5).abs() < 1e-6);
        assert_eq!(FinishLedger::crossing_fraction(100.0, 100.0), 0.0);
    }

    #[test]
    fn earliest_fraction_wins_over_furthest_position() {
        // a reaches the line 10% into the frame, b 50% in but lands further
        let mut entrants = vec![moving("b", 98.0, 102.0), moving("a", 99.9, 100.9)];
        let mut ledger = FinishLedger::default();
        let crossings = ledger.resolve(&mut entrants);

        assert_eq!(crossings[0].id, "a");
        assert_eq!(ledger.winner.as_deref(), Some("a"));
        assert_eq!(entrants[1].finish_order, Some(1));
        assert_eq!(entrants[0].finish_order, Some(2));
    }

    #[test]
    fn equal_fraction_breaks_tie_by_position() {
        let mut entrants = vec![moving("a", 99.0, 101.0), moving("b", 98.0, 102.0)];
        let crossings = FinishLedger::detect(&entrants);
        assert_eq!(crossings[0].id, "b");
        let mut ledger = FinishLedger::default();
        ledger.resolve(&mut entrants);
        assert_eq!(ledger.winner.as_deref(), Some("b"));
    }

    #[test]
    fn winner_is_never_reassigned() {
        let mut entrants = vec![moving("a", 99.0, 100.5), moving("b", 50.0, 51.0)];
        let mut ledger = FinishLedger::default();
        ledger.resolve(&mut entrants);

        entrants[1].advance(50.0);
        ledger.resolve(&mut entrants);
        assert_eq!(ledger.winner.as_deref(), Some("a"));
        assert_eq!(entrants[1].finish_order, Some(2));
    }

    #[test]
    fn finished_entrants_are_not_counted_twice() {
        let mut entrants = vec![moving("a", 99.0, 100.5), moving("b", 0.0, 1.0)];
        let mut ledger = FinishLedger::default();
        ledger.resolve(&mut entrants);
        ledger.resolve(&mut entrants);
        assert_eq!(ledger.finished_count, 1);
    }

    #[test]
    fn stop_requires_winner_and_podium() {
        let mut ledger = FinishLedger::default();
        assert_eq!(ledger.stop_reason(5, 10, 600, 240), None);

        ledger.winner = Some("a".into());
        ledger.finished_count = 2;
        assert_eq!(ledger.stop_reason(5, 10, 600, 240), None);
        assert_eq!(ledger.stop_reason(2, 10, 600, 240), Some(StopReason::PodiumFilled));
        assert_eq!(ledger.stop_reason(5, 840, 600, 240), Some(StopReason::Overtime));

        ledger.finished_count = 3;
        assert_eq!(ledger.stop_reason(5, 10, 600, 240), Some(StopReason::PodiumFilled));
    }

    #[test]
    fn overtime_without_winner_forces_stop() {
        let ledger = FinishLedger::default();
        assert_eq!(ledger.stop_reason(4, 839, 600, 240), None);
        assert_eq!(ledger.stop_reason(4, 840, 600, 240), Some(StopReason::ForcedStop));
    }

    #[test]
    fn forced_winner_is_furthest_along() {
        let mut entrants = vec![
            Entrant::neutral("a", 40.0),
            Entrant::neutral("b", 97.0),
            Entrant::neutral("c", 60.0),
        ];
        let mut ledger = FinishLedger::default();
        ledger.force_winner(&mut entrants);
        assert_eq!(ledger.winner.as_deref(), Some("b"));
        assert_eq!(entrants[1].finish_order, Some(1));
    }

    #[test]
    fn standings_put_finishers_first_then_position() {
        let mut entrants = vec![
            Entrant::neutral("slow", 20.0),
            Entrant::neutral("second", 100.2),
            Entrant::neutral("mid", 80.0),
            Entrant::neutral("first", 100.1),
        ];
        entrants[1].mark_finished(2);
        entrants[3].mark_finished(1);

        let ids: Vec<&str> = standings(&entrants).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "mid", "slow"]);

        let placed = results(&entrants);
        assert_eq!(placed[2].position, 3);
        assert_eq!(placed[2].finish_order, None);
    }
}
