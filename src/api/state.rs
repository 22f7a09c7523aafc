use std::sync::Arc;

use crate::services::RecommendationService;

/// Bounds on the batch size a caller may ask for
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub default_batch_size: usize,
    pub max_batch_size: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            default_batch_size: 6,
            max_batch_size: 50,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
    pub limits: BatchLimits,
}

impl AppState {
    pub fn new(recommendations: RecommendationService, limits: BatchLimits) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
            limits,
        }
    }
}
