// src/selection.rs
//
// Maps one obstacle to the predictor kind that should handle it.
// Pure lookup against an assignment table populated once from config;
// nothing here mutates after init.

use crate::obstacle::Obstacle;
use crate::types::{
    AssignmentEntry, ObstacleClass, ObstaclePriority, ObstacleStatus, PredictorKind,
};
use tracing::{debug, error, info};

/// Outcome of one selection. `kind` is `None` when the matching slot was
/// never configured; the scheduler then emits a record with an empty
/// trajectory list. An ignored obstacle additionally forces its record
/// priority to `Ignore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: Option<PredictorKind>,
    pub priority_override: Option<ObstaclePriority>,
}

impl Selection {
    fn of(kind: Option<PredictorKind>) -> Self {
        Self {
            kind,
            priority_override: None,
        }
    }
}

/// The assignment table. Vehicles get five slots (off-lane has no
/// caution variant), bicycles and the default bucket two each,
/// pedestrians one.
#[derive(Debug, Default)]
pub struct PredictorSelector {
    vehicle_on_lane: Option<PredictorKind>,
    vehicle_on_lane_caution: Option<PredictorKind>,
    vehicle_off_lane: Option<PredictorKind>,
    vehicle_in_junction: Option<PredictorKind>,
    vehicle_in_junction_caution: Option<PredictorKind>,
    cyclist_on_lane: Option<PredictorKind>,
    cyclist_off_lane: Option<PredictorKind>,
    pedestrian: Option<PredictorKind>,
    default_on_lane: Option<PredictorKind>,
    default_off_lane: Option<PredictorKind>,
}

impl PredictorSelector {
    /// Populate the table. Malformed entries (missing class or predictor)
    /// are logged and skipped; the affected slot stays unset.
    pub fn from_config(entries: &[AssignmentEntry]) -> Self {
        let mut selector = Self::default();
        for entry in entries {
            let Some(class) = entry.class else {
                error!("Assignment entry {:?} has no obstacle class, skipping", entry);
                continue;
            };
            let Some(kind) = entry.predictor else {
                error!("Assignment entry {:?} has no predictor kind, skipping", entry);
                continue;
            };

            match class {
                ObstacleClass::Vehicle => {
                    selector.assign_vehicle(entry.status, entry.priority, kind)
                }
                ObstacleClass::Bicycle => selector.assign_cyclist(entry.status, kind),
                ObstacleClass::Pedestrian => selector.pedestrian = Some(kind),
                ObstacleClass::Unknown => selector.assign_default(entry.status, kind),
            }
        }

        info!(
            "Vehicle predictors: on_lane={:?} on_lane_caution={:?} off_lane={:?} \
             in_junction={:?} in_junction_caution={:?}",
            selector.vehicle_on_lane,
            selector.vehicle_on_lane_caution,
            selector.vehicle_off_lane,
            selector.vehicle_in_junction,
            selector.vehicle_in_junction_caution,
        );
        info!(
            "Cyclist predictors: on_lane={:?} off_lane={:?}",
            selector.cyclist_on_lane, selector.cyclist_off_lane,
        );
        info!("Pedestrian predictor: {:?}", selector.pedestrian);
        info!(
            "Default predictors: on_lane={:?} off_lane={:?}",
            selector.default_on_lane, selector.default_off_lane,
        );

        selector
    }

    fn assign_vehicle(
        &mut self,
        status: ObstacleStatus,
        priority: ObstaclePriority,
        kind: PredictorKind,
    ) {
        match status {
            ObstacleStatus::OnLane => {
                if priority == ObstaclePriority::Caution {
                    self.vehicle_on_lane_caution = Some(kind);
                } else {
                    self.vehicle_on_lane = Some(kind);
                }
            }
            // The off-lane bucket deliberately has no caution variant.
            ObstacleStatus::OffLane => self.vehicle_off_lane = Some(kind),
            ObstacleStatus::InJunction => {
                if priority == ObstaclePriority::Caution {
                    self.vehicle_in_junction_caution = Some(kind);
                } else {
                    self.vehicle_in_junction = Some(kind);
                }
            }
        }
    }

    fn assign_cyclist(&mut self, status: ObstacleStatus, kind: PredictorKind) {
        match status {
            ObstacleStatus::OnLane => self.cyclist_on_lane = Some(kind),
            ObstacleStatus::OffLane => self.cyclist_off_lane = Some(kind),
            ObstacleStatus::InJunction => {}
        }
    }

    fn assign_default(&mut self, status: ObstacleStatus, kind: PredictorKind) {
        match status {
            ObstacleStatus::OnLane => self.default_on_lane = Some(kind),
            ObstacleStatus::OffLane => self.default_off_lane = Some(kind),
            ObstacleStatus::InJunction => {}
        }
    }

    /// Resolve the predictor kind for one obstacle.
    ///
    /// Precedence: ignore > still > class > on/off-lane > junction-depth
    /// > caution.
    pub fn select(&self, obstacle: &Obstacle) -> Selection {
        if obstacle.to_ignore() {
            debug!("Ignoring obstacle [{}]", obstacle.id);
            return Selection {
                kind: Some(PredictorKind::Empty),
                priority_override: Some(ObstaclePriority::Ignore),
            };
        }
        if obstacle.is_still() {
            debug!("Still obstacle [{}]", obstacle.id);
            return Selection::of(Some(PredictorKind::Empty));
        }

        let kind = match obstacle.class {
            ObstacleClass::Vehicle => self.vehicle_slot(obstacle),
            ObstacleClass::Pedestrian => self.pedestrian,
            ObstacleClass::Bicycle => {
                if obstacle.is_on_lane() {
                    self.cyclist_on_lane
                } else {
                    self.cyclist_off_lane
                }
            }
            ObstacleClass::Unknown => {
                if obstacle.is_on_lane() {
                    self.default_on_lane
                } else {
                    self.default_off_lane
                }
            }
        };
        Selection::of(kind)
    }

    fn vehicle_slot(&self, obstacle: &Obstacle) -> Option<PredictorKind> {
        if !obstacle.is_on_lane() {
            return self.vehicle_off_lane;
        }
        // Junction takes priority over the plain on-lane slots as long
        // as the obstacle has not yet reached an exit.
        if obstacle.has_junction_exits() && !obstacle.is_close_to_junction_exit() {
            return if obstacle.is_caution() {
                self.vehicle_in_junction_caution
            } else {
                self.vehicle_in_junction
            };
        }
        if obstacle.is_caution() {
            self.vehicle_on_lane_caution
        } else {
            self.vehicle_on_lane
        }
    }
}
