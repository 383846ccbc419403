//! Injector - Random burst and brake impulses
//!
//! Each frame every entrant rolls independently for a burst and for a
//! brake. A hit adds (or removes) a single-frame impulse scaled by the
//! chaos-derived magnitude.

use crate::race_engine::rng::RandomSource;
use crate::race_engine::tuning::Tuning;

pub struct EventInjector;

impl EventInjector {
    /// Impulses land between half and all of the tuned magnitude
    const MAGNITUDE_RANGE: (f32, f32) = (0.5, 1.0);

    /// Net velocity change for one entrant this frame
    pub fn impulse<R: RandomSource>(tuning: &Tuning, rng: &mut R) -> f32 {
        let mut delta = 0.0;
        if rng.chance(tuning.burst_probability) {
            delta += rng.uniform(Self::MAGNITUDE_RANGE.0, Self::MAGNITUDE_RANGE.1)
                * tuning.burst_magnitude;
        }
        if rng.chance(tuning.brake_probability) {
            delta -= rng.uniform(Self::MAGNITUDE_RANGE.0, Self::MAGNITUDE_RANGE.1)
                * tuning.brake_magnitude;
        }
        delta
    }
}
