// src/predictor/registry.rs

use super::{Predictor, PredictorFactory};
use crate::types::PredictorKind;
use std::collections::HashMap;
use tracing::{debug, info};

/// Holds at most one strategy instance per kind. Built once at startup
/// from a factory and immutable afterwards; `get` never constructs.
pub struct PredictorRegistry {
    predictors: HashMap<PredictorKind, Box<dyn Predictor>>,
}

impl PredictorRegistry {
    /// Ask the factory for every kind in the closed set, in order.
    pub fn build(factory: &dyn PredictorFactory) -> Self {
        let mut predictors: HashMap<PredictorKind, Box<dyn Predictor>> = HashMap::new();
        for kind in PredictorKind::ALL {
            match factory.create(kind) {
                Some(predictor) => {
                    predictors.insert(kind, predictor);
                    info!("Predictor {:?} registered", kind);
                }
                None => debug!("No predictor supplied for kind {:?}", kind),
            }
        }
        Self { predictors }
    }

    pub fn get(&self, kind: PredictorKind) -> Option<&dyn Predictor> {
        self.predictors.get(&kind).map(|p| p.as_ref())
    }

    pub fn contains(&self, kind: PredictorKind) -> bool {
        self.predictors.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.predictors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictors.is_empty()
    }
}
