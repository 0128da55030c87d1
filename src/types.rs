// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub assignments: Vec<AssignmentEntry>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub parallel: bool,
    pub worker_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Horizon stamped on every record, in seconds
    pub predicted_period: f64,
    pub trim_trajectories: bool,
    pub offline_dump: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One row of the predictor assignment table.
///
/// `class` and `predictor` are optional so that a malformed entry is
/// representable: init logs it and skips the row instead of failing the
/// whole configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub class: Option<ObstacleClass>,
    pub predictor: Option<PredictorKind>,
    #[serde(default)]
    pub status: ObstacleStatus,
    #[serde(default)]
    pub priority: ObstaclePriority,
}

/// Closed set of prediction strategies the registry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    LaneSequence,
    MoveSequence,
    SingleLane,
    FreeMove,
    Regional,
    Empty,
    Junction,
    Extrapolation,
    Interaction,
}

impl PredictorKind {
    pub const ALL: [PredictorKind; 9] = [
        PredictorKind::LaneSequence,
        PredictorKind::MoveSequence,
        PredictorKind::SingleLane,
        PredictorKind::FreeMove,
        PredictorKind::Regional,
        PredictorKind::Empty,
        PredictorKind::Junction,
        PredictorKind::Extrapolation,
        PredictorKind::Interaction,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleClass {
    Vehicle,
    Bicycle,
    Pedestrian,
    /// Anything perception could not classify; routed through the
    /// default on/off-lane buckets.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleStatus {
    #[default]
    OnLane,
    OffLane,
    InJunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstaclePriority {
    #[default]
    Normal,
    Caution,
    Ignore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub v: f64,
    pub relative_time: f64,
}

/// One candidate future path for an obstacle. Produced by a predictor,
/// carried verbatim into the prediction record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub probability: f64,
    pub points: Vec<TrajectoryPoint>,
}

/// Read-only copy of what perception reported for one obstacle.
/// Kept even for obstacles the tracker dropped as unmovable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerceptionSnapshot {
    pub id: i32,
    pub timestamp: f64,
    pub position: (f64, f64),
    pub velocity: (f64, f64),
    pub priority: ObstaclePriority,
}

/// The per-obstacle output of one scheduler run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRecord {
    pub timestamp: f64,
    pub predicted_period: f64,
    pub is_static: bool,
    pub priority: ObstaclePriority,
    pub trajectories: Vec<Trajectory>,
    pub perception: PerceptionSnapshot,
}

/// All prediction records for the current frame. Cleared and rebuilt on
/// every scheduler run; nothing carries over between frames.
#[derive(Debug, Default)]
pub struct PredictionFrame {
    records: Vec<PredictionRecord>,
}

impl PredictionFrame {
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn push(&mut self, record: PredictionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
