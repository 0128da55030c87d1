// src/ego_path.rs

use crate::types::TrajectoryPoint;

/// Planned path of the ego vehicle. Read-only during a scheduler run;
/// only consulted by predictors when trajectory trimming is enabled.
#[derive(Debug, Clone, Default)]
pub struct EgoPathContainer {
    points: Vec<TrajectoryPoint>,
}

impl EgoPathContainer {
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
