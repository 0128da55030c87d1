// src/scheduler.rs
//
// Runs one perception frame through selection and the matched
// predictors, either sequentially or fanned out over a fixed worker
// pool partitioned by obstacle id. Both modes produce the same set of
// records; only the output order differs.

use crate::dump::{DumpSink, Scenario};
use crate::ego_path::EgoPathContainer;
use crate::obstacle::{Obstacle, ObstaclesContainer};
use crate::predictor::{PredictorFactory, PredictorRegistry};
use crate::selection::PredictorSelector;
use crate::types::{Config, ObstacleClass, PredictionFrame, PredictionRecord};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

pub struct PredictionScheduler {
    registry: PredictorRegistry,
    selector: PredictorSelector,
    /// Present only in parallel mode; built once with the configured
    /// thread count.
    pool: Option<rayon::ThreadPool>,
    worker_threads: usize,
    predicted_period: f64,
    trim_trajectories: bool,
    offline_dump: bool,
    dump_sink: Option<Arc<dyn DumpSink>>,
    scenario: Scenario,
    output: PredictionFrame,
}

impl PredictionScheduler {
    pub fn new(config: &Config, factory: &dyn PredictorFactory) -> Result<Self> {
        let worker_threads = config.scheduler.worker_threads.max(1);
        let pool = if config.scheduler.parallel {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(worker_threads)
                    .build()
                    .context("failed to build prediction worker pool")?,
            )
        } else {
            None
        };

        Ok(Self {
            registry: PredictorRegistry::build(factory),
            selector: PredictorSelector::from_config(&config.assignments),
            pool,
            worker_threads,
            predicted_period: config.prediction.predicted_period,
            trim_trajectories: config.prediction.trim_trajectories,
            offline_dump: config.prediction.offline_dump,
            dump_sink: None,
            scenario: Scenario::default(),
            output: PredictionFrame::default(),
        })
    }

    pub fn set_dump_sink(&mut self, sink: Arc<dyn DumpSink>) {
        self.dump_sink = Some(sink);
    }

    /// Scenario context attached to dumped records for the coming runs.
    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
    }

    /// Predict every obstacle of the current frame. The previous frame's
    /// output is discarded first.
    pub fn run(&mut self, ego_path: &EgoPathContainer, container: &ObstaclesContainer) {
        self.output.clear();
        let records = match &self.pool {
            Some(pool) => self.predict_parallel(pool, ego_path, container),
            None => self.predict_sequential(ego_path, container),
        };
        for record in records {
            self.output.push(record);
        }
    }

    pub fn prediction_frame(&self) -> &PredictionFrame {
        &self.output
    }

    fn predict_sequential(
        &self,
        ego_path: &EgoPathContainer,
        container: &ObstaclesContainer,
    ) -> Vec<PredictionRecord> {
        let mut records = Vec::with_capacity(container.curr_frame_ids().len());
        for &id in container.curr_frame_ids() {
            if id < 0 {
                debug!("Obstacle has invalid id [{}]", id);
                continue;
            }

            let snapshot = container.perception_snapshot(id);
            let mut record = PredictionRecord::default();
            match container.get_obstacle(id) {
                Some(obstacle) => {
                    self.predict_obstacle(ego_path, obstacle, container, &mut record)
                }
                // Absent from the tracker means unmovable; selection
                // never runs for these.
                None => {
                    record.timestamp = snapshot.timestamp;
                    record.is_static = true;
                }
            }

            record.predicted_period = self.predicted_period;
            record.perception = snapshot;
            records.push(record);
        }
        records
    }

    fn predict_parallel(
        &self,
        pool: &rayon::ThreadPool,
        ego_path: &EgoPathContainer,
        container: &ObstaclesContainer,
    ) -> Vec<PredictionRecord> {
        // Fix the slot key set before any work begins.
        let mut slots: HashMap<i32, PredictionRecord> = container
            .curr_frame_ids()
            .iter()
            .map(|&id| (id, PredictionRecord::default()))
            .collect();

        // Unmovable obstacles are resolved inline; the rest are bucketed
        // by id modulo the pool size.
        let mut buckets: Vec<Vec<i32>> = vec![Vec::new(); self.worker_threads];
        for &id in container.curr_frame_ids() {
            if container.get_obstacle(id).is_some() {
                let index = id.rem_euclid(self.worker_threads as i32) as usize;
                buckets[index].push(id);
            } else {
                let snapshot = container.perception_snapshot(id);
                if let Some(slot) = slots.get_mut(&id) {
                    slot.timestamp = snapshot.timestamp;
                    slot.is_static = true;
                }
            }
        }

        // One task per bucket. Each worker only handles its own ids and
        // collects into a local buffer; buffers are merged after the
        // join barrier, so the slot map is never shared mutably.
        let bucket_records: Vec<Vec<(i32, PredictionRecord)>> = pool.install(|| {
            buckets
                .into_par_iter()
                .map(|bucket| {
                    bucket
                        .into_iter()
                        .map(|id| {
                            let mut record = PredictionRecord::default();
                            match container.get_obstacle(id) {
                                Some(obstacle) => self.predict_obstacle(
                                    ego_path, obstacle, container, &mut record,
                                ),
                                // Slot stays at default values; the rest
                                // of the bucket continues.
                                None => error!("Null obstacle [{}] found", id),
                            }
                            (id, record)
                        })
                        .collect()
                })
                .collect()
        });

        for (id, record) in bucket_records.into_iter().flatten() {
            if let Some(slot) = slots.get_mut(&id) {
                *slot = record;
            }
        }

        // Keyed-map order, not frame order: consumers must treat the
        // parallel output as a set.
        slots
            .into_iter()
            .map(|(id, mut record)| {
                record.predicted_period = self.predicted_period;
                record.perception = container.perception_snapshot(id);
                record
            })
            .collect()
    }

    /// Selection, predictor invocation, and post-processing for one
    /// movable obstacle.
    fn predict_obstacle(
        &self,
        ego_path: &EgoPathContainer,
        obstacle: &Obstacle,
        container: &ObstaclesContainer,
        record: &mut PredictionRecord,
    ) {
        record.timestamp = obstacle.timestamp();
        let selection = self.selector.select(obstacle);

        let mut trajectories = Vec::new();
        match selection.kind.and_then(|kind| self.registry.get(kind)) {
            Some(predictor) => {
                trajectories = predictor.predict(ego_path, obstacle, container);
                if self.trim_trajectories && obstacle.class == ObstacleClass::Vehicle {
                    predictor.trim(ego_path, obstacle, &mut trajectories);
                }
            }
            // Unset slot or unregistered kind: the record still goes
            // out, with an empty trajectory list.
            None => debug!("No predictor resolved for obstacle [{}]", obstacle.id),
        }

        record.trajectories = trajectories;
        record.priority = obstacle.feature.priority;
        if let Some(priority) = selection.priority_override {
            record.priority = priority;
        }
        // Re-derived from live state after prediction rather than cached
        // from selection time.
        record.is_static = obstacle.is_still();

        if self.offline_dump {
            if let Some(sink) = &self.dump_sink {
                sink.insert(obstacle, record, selection.kind, &self.scenario);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{EmptyPredictor, Predictor};
    use crate::types::{
        AssignmentEntry, ObstaclePriority, ObstacleStatus, PerceptionSnapshot, PredictorKind,
        Trajectory, TrajectoryPoint,
    };
    use std::sync::Mutex;

    /// Deterministic stand-in for a real strategy: one trajectory whose
    /// probability tags the kind and whose points encode the obstacle id.
    struct StubPredictor {
        kind: PredictorKind,
    }

    fn kind_tag(kind: PredictorKind) -> f64 {
        PredictorKind::ALL.iter().position(|&k| k == kind).unwrap() as f64
    }

    impl Predictor for StubPredictor {
        fn predict(
            &self,
            _ego_path: &EgoPathContainer,
            obstacle: &Obstacle,
            _container: &ObstaclesContainer,
        ) -> Vec<Trajectory> {
            vec![Trajectory {
                probability: kind_tag(self.kind),
                points: vec![
                    TrajectoryPoint {
                        x: obstacle.id as f64,
                        relative_time: 0.1,
                        ..Default::default()
                    },
                    TrajectoryPoint {
                        x: obstacle.id as f64 + 1.0,
                        relative_time: 0.2,
                        ..Default::default()
                    },
                ],
            }]
        }

        fn trim(
            &self,
            _ego_path: &EgoPathContainer,
            _obstacle: &Obstacle,
            trajectories: &mut Vec<Trajectory>,
        ) {
            for trajectory in trajectories {
                trajectory.points.truncate(1);
            }
        }
    }

    struct StubFactory;

    impl PredictorFactory for StubFactory {
        fn create(&self, kind: PredictorKind) -> Option<Box<dyn Predictor>> {
            match kind {
                PredictorKind::Empty => Some(Box::new(EmptyPredictor)),
                _ => Some(Box::new(StubPredictor { kind })),
            }
        }
    }

    fn entry(
        class: ObstacleClass,
        status: ObstacleStatus,
        kind: PredictorKind,
    ) -> AssignmentEntry {
        AssignmentEntry {
            class: Some(class),
            predictor: Some(kind),
            status,
            priority: ObstaclePriority::Normal,
        }
    }

    fn test_config(parallel: bool) -> Config {
        use crate::types::{LoggingConfig, PredictionConfig, SchedulerConfig};
        Config {
            scheduler: SchedulerConfig {
                parallel,
                worker_threads: 3,
            },
            prediction: PredictionConfig {
                predicted_period: 8.0,
                trim_trajectories: false,
                offline_dump: false,
            },
            assignments: vec![
                entry(
                    ObstacleClass::Vehicle,
                    ObstacleStatus::OnLane,
                    PredictorKind::LaneSequence,
                ),
                entry(
                    ObstacleClass::Vehicle,
                    ObstacleStatus::OffLane,
                    PredictorKind::FreeMove,
                ),
                entry(
                    ObstacleClass::Bicycle,
                    ObstacleStatus::OnLane,
                    PredictorKind::LaneSequence,
                ),
                entry(
                    ObstacleClass::Pedestrian,
                    ObstacleStatus::OnLane,
                    PredictorKind::Regional,
                ),
            ],
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
        }
    }

    fn movable(id: i32, class: ObstacleClass, on_lane: bool, timestamp: f64) -> Obstacle {
        let mut obstacle = Obstacle::new(id, class);
        obstacle.on_lane = on_lane;
        obstacle.feature.timestamp = timestamp;
        obstacle
    }

    fn snapshot(id: i32, timestamp: f64) -> PerceptionSnapshot {
        PerceptionSnapshot {
            id,
            timestamp,
            ..Default::default()
        }
    }

    #[test]
    fn test_sequential_preserves_frame_order_and_skips_invalid_ids() {
        let mut container = ObstaclesContainer::new();
        container.insert(
            movable(12, ObstacleClass::Vehicle, true, 1.0),
            snapshot(12, 1.0),
        );
        container.insert_frame_id(-1);
        container.insert(
            movable(5, ObstacleClass::Pedestrian, false, 1.0),
            snapshot(5, 1.0),
        );

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].perception.id, 12);
        assert_eq!(records[1].perception.id, 5);
    }

    #[test]
    fn test_absent_obstacle_yields_minimal_static_record() {
        let mut container = ObstaclesContainer::new();
        container.insert_perception_only(snapshot(9, 42.5));

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_static);
        assert_eq!(records[0].timestamp, 42.5);
        assert!(records[0].trajectories.is_empty());
        assert_eq!(records[0].predicted_period, 8.0);
        assert_eq!(records[0].perception.id, 9);
    }

    #[test]
    fn test_unset_slot_still_emits_a_record() {
        // Unknown class was never configured.
        let mut container = ObstaclesContainer::new();
        container.insert(
            movable(2, ObstacleClass::Unknown, true, 3.0),
            snapshot(2, 3.0),
        );

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert_eq!(records.len(), 1);
        assert!(records[0].trajectories.is_empty());
        assert!(!records[0].is_static);
        assert_eq!(records[0].timestamp, 3.0);
    }

    #[test]
    fn test_ignored_obstacle_gets_ignore_priority_and_no_trajectory() {
        let mut container = ObstaclesContainer::new();
        let mut obstacle = movable(4, ObstacleClass::Vehicle, true, 1.5);
        obstacle.ignore = true;
        container.insert(obstacle, snapshot(4, 1.5));

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert_eq!(records[0].priority, ObstaclePriority::Ignore);
        assert!(records[0].trajectories.is_empty());
    }

    #[test]
    fn test_still_obstacle_is_static_with_no_trajectory() {
        let mut container = ObstaclesContainer::new();
        let mut obstacle = movable(4, ObstacleClass::Vehicle, true, 1.5);
        obstacle.still = true;
        container.insert(obstacle, snapshot(4, 1.5));

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert!(records[0].is_static);
        assert!(records[0].trajectories.is_empty());
        assert_eq!(records[0].priority, ObstaclePriority::Normal);
    }

    #[test]
    fn test_trim_applies_only_to_vehicles_when_enabled() {
        let mut container = ObstaclesContainer::new();
        container.insert(
            movable(1, ObstacleClass::Vehicle, true, 1.0),
            snapshot(1, 1.0),
        );
        container.insert(
            movable(2, ObstacleClass::Bicycle, true, 1.0),
            snapshot(2, 1.0),
        );

        let mut config = test_config(false);
        config.prediction.trim_trajectories = true;
        let mut scheduler = PredictionScheduler::new(&config, &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        let vehicle = records.iter().find(|r| r.perception.id == 1).unwrap();
        let bicycle = records.iter().find(|r| r.perception.id == 2).unwrap();
        assert_eq!(vehicle.trajectories[0].points.len(), 1);
        assert_eq!(bicycle.trajectories[0].points.len(), 2);
    }

    #[test]
    fn test_trim_disabled_keeps_raw_predictor_output() {
        let mut container = ObstaclesContainer::new();
        container.insert(
            movable(1, ObstacleClass::Vehicle, true, 1.0),
            snapshot(1, 1.0),
        );

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert_eq!(records[0].trajectories[0].points.len(), 2);
        assert_eq!(
            records[0].trajectories[0].probability,
            kind_tag(PredictorKind::LaneSequence)
        );
    }

    #[test]
    fn test_rerun_clears_previous_output() {
        let mut container = ObstaclesContainer::new();
        container.insert(
            movable(1, ObstacleClass::Vehicle, true, 1.0),
            snapshot(1, 1.0),
        );

        let mut scheduler =
            PredictionScheduler::new(&test_config(false), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);
        scheduler.run(&EgoPathContainer::default(), &container);

        assert_eq!(scheduler.prediction_frame().len(), 1);
    }

    struct CollectingSink {
        seen: Mutex<Vec<(i32, Option<PredictorKind>)>>,
    }

    impl DumpSink for CollectingSink {
        fn insert(
            &self,
            obstacle: &Obstacle,
            _record: &PredictionRecord,
            kind: Option<PredictorKind>,
            _scenario: &Scenario,
        ) {
            self.seen.lock().unwrap().push((obstacle.id, kind));
        }
    }

    #[test]
    fn test_offline_dump_hands_records_to_the_sink() {
        let mut container = ObstaclesContainer::new();
        container.insert(
            movable(1, ObstacleClass::Vehicle, true, 1.0),
            snapshot(1, 1.0),
        );
        // Unmovable obstacles never reach the dump path.
        container.insert_perception_only(snapshot(2, 1.0));

        let mut config = test_config(false);
        config.prediction.offline_dump = true;
        let mut scheduler = PredictionScheduler::new(&config, &StubFactory).unwrap();
        let sink = Arc::new(CollectingSink {
            seen: Mutex::new(Vec::new()),
        });
        scheduler.set_dump_sink(sink.clone());
        scheduler.run(&EgoPathContainer::default(), &container);

        let seen = sink.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[(1, Some(PredictorKind::LaneSequence))]
        );
    }

    #[test]
    fn test_parallel_mode_covers_every_frame_id() {
        let mut container = ObstaclesContainer::new();
        for id in 0..10 {
            container.insert(
                movable(id, ObstacleClass::Vehicle, id % 2 == 0, 1.0),
                snapshot(id, 1.0),
            );
        }
        container.insert_perception_only(snapshot(10, 7.0));

        let mut scheduler =
            PredictionScheduler::new(&test_config(true), &StubFactory).unwrap();
        scheduler.run(&EgoPathContainer::default(), &container);

        let records = scheduler.prediction_frame().records();
        assert_eq!(records.len(), 11);

        let mut ids: Vec<i32> = records.iter().map(|r| r.perception.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..=10).collect::<Vec<_>>());

        let unmovable = records.iter().find(|r| r.perception.id == 10).unwrap();
        assert!(unmovable.is_static);
        assert_eq!(unmovable.timestamp, 7.0);
    }
}
