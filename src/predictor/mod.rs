// src/predictor/mod.rs
//
// Seam between the dispatch core and the actual prediction strategies.
// Strategies live in the embedding application; this crate only knows
// the capability set {predict, optional trim} and the closed kind set.

mod registry;

pub use registry::PredictorRegistry;

use crate::ego_path::EgoPathContainer;
use crate::obstacle::{Obstacle, ObstaclesContainer};
use crate::types::{PredictorKind, Trajectory};

/// One pluggable prediction strategy.
///
/// `predict` returns the candidate trajectories for the obstacle; the
/// scheduler copies them verbatim into the record. `trim` may shrink or
/// rewrite those trajectories against the ego path; the default is a
/// no-op, matching strategies that never trim.
pub trait Predictor: Send + Sync {
    fn predict(
        &self,
        ego_path: &EgoPathContainer,
        obstacle: &Obstacle,
        container: &ObstaclesContainer,
    ) -> Vec<Trajectory>;

    fn trim(
        &self,
        _ego_path: &EgoPathContainer,
        _obstacle: &Obstacle,
        _trajectories: &mut Vec<Trajectory>,
    ) {
    }
}

/// Supplies one strategy instance per kind at registry build time.
/// Returning `None` leaves that kind unregistered.
pub trait PredictorFactory {
    fn create(&self, kind: PredictorKind) -> Option<Box<dyn Predictor>>;
}

/// The empty strategy: predicts nothing. Ignored and still obstacles are
/// always routed here, so it ships with the core rather than with the
/// embedding application.
#[derive(Debug, Default)]
pub struct EmptyPredictor;

impl Predictor for EmptyPredictor {
    fn predict(
        &self,
        _ego_path: &EgoPathContainer,
        _obstacle: &Obstacle,
        _container: &ObstaclesContainer,
    ) -> Vec<Trajectory> {
        Vec::new()
    }
}

/// Factory providing only the empty strategy. Useful as a base for
/// applications that register strategies incrementally, and in tests.
#[derive(Debug, Default)]
pub struct EmptyOnlyFactory;

impl PredictorFactory for EmptyOnlyFactory {
    fn create(&self, kind: PredictorKind) -> Option<Box<dyn Predictor>> {
        match kind {
            PredictorKind::Empty => Some(Box::new(EmptyPredictor)),
            _ => None,
        }
    }
}
