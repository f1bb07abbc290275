use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::assessment::engine::ProgressSnapshot;
use crate::assessment::service::{AnswerOutcome, StartedAssessment};
use crate::errors::AppError;
use crate::models::assessment::{AnswerRecord, QuestionView, Report};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LearnerIdQuery {
    pub learner_id: Uuid,
}

#[derive(Deserialize)]
pub struct StartRequest {
    pub learner_id: Uuid,
    pub subject: String,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub learner_id: Uuid,
    pub selected_option: String,
}

/// POST /api/v1/assessments/start
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartedAssessment>, AppError> {
    let started = state.assessments.start(req.learner_id, &req.subject).await?;
    Ok(Json(started))
}

/// POST /api/v1/assessments/answer
pub async fn handle_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerOutcome>, AppError> {
    let outcome = state
        .assessments
        .answer(req.learner_id, &req.selected_option)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/assessments/question
pub async fn handle_current_question(
    State(state): State<AppState>,
    Query(params): Query<LearnerIdQuery>,
) -> Json<Option<QuestionView>> {
    Json(state.assessments.current_question(params.learner_id).await)
}

/// GET /api/v1/assessments/report
/// `null` until the session completes; stable afterwards.
pub async fn handle_report(
    State(state): State<AppState>,
    Query(params): Query<LearnerIdQuery>,
) -> Json<Option<Report>> {
    Json(state.assessments.report(params.learner_id).await)
}

/// GET /api/v1/assessments/history
/// Graded entries for the review screen, oldest first. Safe to reveal
/// correct options here — every entry has already been answered.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<LearnerIdQuery>,
) -> Json<Vec<AnswerRecord>> {
    Json(state.assessments.history(params.learner_id).await)
}

/// GET /api/v1/assessments/progress
pub async fn handle_progress(
    State(state): State<AppState>,
    Query(params): Query<LearnerIdQuery>,
) -> Json<ProgressSnapshot> {
    Json(state.assessments.progress(params.learner_id).await)
}

/// DELETE /api/v1/assessments
/// Idempotent: discarding a learner with no session is still 204.
pub async fn handle_reset(
    State(state): State<AppState>,
    Query(params): Query<LearnerIdQuery>,
) -> StatusCode {
    state.assessments.reset(params.learner_id);
    StatusCode::NO_CONTENT
}
