use std::sync::Arc;

use crate::assessment::service::AssessmentService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Per-learner session registry plus the question source behind it.
    pub assessments: Arc<AssessmentService>,
}
