pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Assessment API
        .route("/api/v1/assessments/start", post(handlers::handle_start))
        .route("/api/v1/assessments/answer", post(handlers::handle_answer))
        .route(
            "/api/v1/assessments/question",
            get(handlers::handle_current_question),
        )
        .route(
            "/api/v1/assessments/report",
            get(handlers::handle_report),
        )
        .route(
            "/api/v1/assessments/history",
            get(handlers::handle_history),
        )
        .route(
            "/api/v1/assessments/progress",
            get(handlers::handle_progress),
        )
        .route("/api/v1/assessments", delete(handlers::handle_reset))
        .with_state(state)
}
