//! Phases - Lead-phase planning for engineered momentum swings
//!
//! The race is split into `k + 1` equal, contiguous windows. Each of the
//! first `k` favours one shuffled entrant; the last favours nobody.

use serde::{Deserialize, Serialize};

use crate::race_engine::rng::RandomSource;

/// One window of the race, `[start_frame, end_frame)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub start_frame: u32,
    pub end_frame: u32,
    pub favored: Option<String>,
}

impl Phase {
    pub fn len(&self) -> u32 {
        self.end_frame - self.start_frame
    }

    pub fn is_empty(&self) -> bool {
        self.end_frame == self.start_frame
    }
}

/// Ordered, gap-free partition of `[0, total_frames]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePlan {
    pub phases: Vec<Phase>,
    pub total_frames: u32,
}

impl PhasePlan {
    /// A single neutral window covering the whole race
    pub fn neutral(total_frames: u32) -> Self {
        Self {
            phases: vec![Phase {
                start_frame: 0,
                end_frame: total_frames,
                favored: None,
            }],
            total_frames,
        }
    }

    /// Plan `phase_count` favoured windows plus a closing neutral one.
    /// Favourites repeat when there are more phases than entrants.
    pub fn plan<R: RandomSource>(
        entrant_ids: &[String],
        total_frames: u32,
        phase_count: u32,
        rng: &mut R,
    ) -> Self {
        if entrant_ids.is_empty() || phase_count == 0 {
            return Self::neutral(total_frames);
        }

        let mut shuffled = entrant_ids.to_vec();
        rng.shuffle(&mut shuffled);

        let windows = phase_count as u64 + 1;
        let boundary = |i: u64| (i * total_frames as u64 / windows) as u32;

        let phases = (0..windows)
            .map(|i| Phase {
                start_frame: boundary(i),
                end_frame: boundary(i + 1),
                favored: (i < phase_count as u64)
                    .then(|| shuffled[i as usize % shuffled.len()].clone()),
            })
            .collect();

        Self {
            phases,
            total_frames,
        }
    }

    /// The phase covering `frame`. The final frame belongs to the last
    /// window; frames past the schedule have no phase.
    pub fn active(&self, frame: u32) -> Option<&Phase> {
        if frame > self.total_frames {
            return None;
        }
        self.phases
            .iter()
            .find(|p| frame >= p.start_frame && frame < p.end_frame)
            .or_else(|| self.phases.last().filter(|_| frame == self.total_frames))
    }

    /// Entrant favoured at `frame`, if any
    pub fn favored_at(&self, frame: u32) -> Option<&str> {
        self.active(frame).and_then(|p| p.favored.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_engine::rng::SeededRandom;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("e{i}")).collect()
    }

    #[test]
    fn windows_partition_the_race() {
        let mut rng = SeededRandom::new(5);
        let plan = PhasePlan::plan(&ids(4), 1000, 3, &mut rng);

        assert_eq!(plan.phases.len(), 4);
        assert_eq!(plan.phases[0].start_frame, 0);
        assert_eq!(plan.phases.last().map(|p| p.end_frame), Some(1000));
        for pair in plan.phases.windows(2) {
            assert_eq!(pair[0].end_frame, pair[1].start_frame);
        }
        assert_eq!(plan.phases[3].favored, None);
        assert!(plan.phases[..3].iter().all(|p| p.favored.is_some()));
    }

    #[test]
    fn favourites_repeat_when_phases_outnumber_entrants() {
        let mut rng = SeededRandom::new(8);
        let plan = PhasePlan::plan(&ids(2), 600, 5, &mut rng);
        let favored: Vec<&str> = plan.phases[..5]
            .iter()
            .filter_map(|p| p.favored.as_deref())
            .collect();
        assert_eq!(favored.len(), 5);
        assert_eq!(favored[0], favored[2]);
        assert_eq!(favored[1], favored[3]);
    }

    #[test]
    fn exactly_one_phase_is_active_per_frame() {
        let mut rng = SeededRandom::new(13);
        let plan = PhasePlan::plan(&ids(3), 917, 4, &mut rng);
        for frame in 0..=917 {
            let active = plan
                .phases
                .iter()
                .filter(|p| frame >= p.start_frame && frame < p.end_frame)
                .count();
            if frame < 917 {
                assert_eq!(active, 1, "frame {frame}");
            }
            assert!(plan.active(frame).is_some());
        }
        assert!(plan.active(918).is_none());
    }

    #[test]
    fn neutral_plan_favours_nobody() {
        let plan = PhasePlan::neutral(300);
        assert_eq!(plan.favored_at(0), None);
        assert_eq!(plan.favored_at(300), None);
        assert!(plan.active(150).is_some());
    }
}
