//! Events - Observational notifications emitted by the engine
//!
//! Events are queued during `start`/`tick` and drained by the host; the
//! engine never waits on listeners.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceEvent {
    CountdownStarted {
        seconds: f32,
    },
    RaceBegin {
        entrant_count: usize,
        total_frames: u32,
    },
    LeaderChanged {
        previous_leader_id: Option<String>,
        new_leader_id: String,
    },
    RaceFinished {
        winner_id: String,
        /// Top finishers, winner first
        podium: Vec<String>,
        /// Finish order of every entrant that crossed
        finish_orders: BTreeMap<String, u32>,
    },
}

impl RaceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RaceEvent::CountdownStarted { .. } => "race-countdown-started",
            RaceEvent::RaceBegin { .. } => "race-begin",
            RaceEvent::LeaderChanged { .. } => "leader-changed",
            RaceEvent::RaceFinished { .. } => "race-finished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = RaceEvent::LeaderChanged {
            previous_leader_id: None,
            new_leader_id: "p2".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "leader_changed");
        assert_eq!(value["new_leader_id"], "p2");
        assert!(value["previous_leader_id"].is_null());
        assert_eq!(event.name(), "leader-changed");
    }
}
