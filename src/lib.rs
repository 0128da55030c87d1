// src/lib.rs
//
// Predictor selection and dispatch core: decides which trajectory
// prediction strategy handles each tracked obstacle of a perception
// frame and executes the strategies sequentially or across a fixed
// worker pool, producing one prediction record per obstacle. The
// strategies themselves are supplied by the embedding application
// through `PredictorFactory`.

mod config;
pub mod dump;
pub mod ego_path;
pub mod obstacle;
pub mod predictor;
pub mod scheduler;
pub mod selection;
pub mod types;

pub use dump::{DumpSink, Scenario, ScenarioKind};
pub use ego_path::EgoPathContainer;
pub use obstacle::{Feature, JunctionFeature, Obstacle, ObstaclesContainer};
pub use predictor::{EmptyOnlyFactory, EmptyPredictor, Predictor, PredictorFactory, PredictorRegistry};
pub use scheduler::PredictionScheduler;
pub use selection::{PredictorSelector, Selection};
pub use types::{
    AssignmentEntry, Config, ObstacleClass, ObstaclePriority, ObstacleStatus, PerceptionSnapshot,
    PredictionFrame, PredictionRecord, PredictorKind, Trajectory, TrajectoryPoint,
};
