// src/dump.rs
//
// Optional offline side channel. When the dump flag is on, every
// finished record is handed to the sink together with the scenario the
// frame was predicted under. Fire-and-forget: the sink never feeds back
// into the primary result.

use crate::obstacle::Obstacle;
use crate::types::{PredictionRecord, PredictorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioKind {
    #[default]
    Cruise,
    Junction,
}

/// Driving scenario the current frame was predicted under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub junction_id: Option<String>,
}

pub trait DumpSink: Send + Sync {
    fn insert(
        &self,
        obstacle: &Obstacle,
        record: &PredictionRecord,
        kind: Option<PredictorKind>,
        scenario: &Scenario,
    );
}
