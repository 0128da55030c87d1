// src/obstacle.rs
//
// Read-only view of the tracking container for one frame. The engine
// never mutates obstacles; predictors report their trajectories back
// through return values.

use crate::types::{ObstacleClass, ObstaclePriority, PerceptionSnapshot};
use std::collections::HashMap;

/// Junction context attached to an obstacle when the tracker has mapped
/// it into a junction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JunctionFeature {
    /// Number of junction exits the tracker has recorded
    pub exit_count: usize,
    /// Whether the obstacle is already close to one of those exits
    pub close_to_exit: bool,
}

/// Latest tracked state for one obstacle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub timestamp: f64,
    pub priority: ObstaclePriority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: i32,
    pub class: ObstacleClass,
    pub on_lane: bool,
    pub caution: bool,
    pub still: bool,
    pub ignore: bool,
    pub junction: Option<JunctionFeature>,
    pub feature: Feature,
}

impl Obstacle {
    pub fn new(id: i32, class: ObstacleClass) -> Self {
        Self {
            id,
            class,
            on_lane: false,
            caution: false,
            still: false,
            ignore: false,
            junction: None,
            feature: Feature::default(),
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.feature.timestamp
    }

    pub fn is_on_lane(&self) -> bool {
        self.on_lane
    }

    pub fn is_caution(&self) -> bool {
        self.caution
    }

    pub fn is_still(&self) -> bool {
        self.still
    }

    pub fn to_ignore(&self) -> bool {
        self.ignore
    }

    /// True when the tracker has a junction feature with at least one
    /// recorded exit for this obstacle.
    pub fn has_junction_exits(&self) -> bool {
        self.junction.map_or(false, |j| j.exit_count > 0)
    }

    pub fn is_close_to_junction_exit(&self) -> bool {
        self.junction.map_or(false, |j| j.close_to_exit)
    }
}

/// Per-frame tracking container. Obstacles the tracker classified as
/// unmovable are present only as perception snapshots; `get_obstacle`
/// returns `None` for them and the scheduler emits a minimal static
/// record without running selection.
#[derive(Debug, Default)]
pub struct ObstaclesContainer {
    obstacles: HashMap<i32, Obstacle>,
    perception: HashMap<i32, PerceptionSnapshot>,
    curr_frame_ids: Vec<i32>,
}

impl ObstaclesContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a movable obstacle for the current frame.
    pub fn insert(&mut self, obstacle: Obstacle, snapshot: PerceptionSnapshot) {
        let id = obstacle.id;
        self.obstacles.insert(id, obstacle);
        self.perception.insert(id, snapshot);
        self.curr_frame_ids.push(id);
    }

    /// Track an unmovable obstacle: perception saw it, but there is no
    /// obstacle state to predict from.
    pub fn insert_perception_only(&mut self, snapshot: PerceptionSnapshot) {
        let id = snapshot.id;
        self.perception.insert(id, snapshot);
        self.curr_frame_ids.push(id);
    }

    /// Push a raw id into the current frame without any backing state.
    /// Perception occasionally reports ids the tracker rejected outright
    /// (e.g. negative ids); the scheduler filters them.
    pub fn insert_frame_id(&mut self, id: i32) {
        self.curr_frame_ids.push(id);
    }

    pub fn get_obstacle(&self, id: i32) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// Perception snapshot for an id, defaulted when perception has
    /// nothing stored for it.
    pub fn perception_snapshot(&self, id: i32) -> PerceptionSnapshot {
        self.perception.get(&id).cloned().unwrap_or_default()
    }

    /// Ids of the current frame, in perception arrival order.
    pub fn curr_frame_ids(&self) -> &[i32] {
        &self.curr_frame_ids
    }
}
