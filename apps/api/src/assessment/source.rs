//! Question source — the seam between the engine and whatever produces
//! questions.
//!
//! `AppState` carries an `Arc<dyn QuestionSource>`, so the LLM-backed source
//! can be swapped for a mock in tests without touching the service or the
//! handlers. Fetching is a single bounded wait with a deterministic fallback
//! branch: the adaptive loop must always be able to proceed, so a slow or
//! failing source degrades to the local bank instead of failing the session.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::assessment::fallback::fallback_question;
use crate::assessment::prompts::{build_question_prompt, question_system};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::assessment::{Level, Question};

/// Produces one question for (subject, level), given the already-asked
/// questions as a dedup hint. Sources are not required to honor the hint —
/// grading never depends on it.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(
        &self,
        subject: &str,
        level: Level,
        prior_questions: &[Question],
    ) -> Result<Question, AppError>;
}

/// A fetched question plus where it came from.
#[derive(Debug, Clone)]
pub struct FetchedQuestion {
    pub question: Question,
    pub used_fallback: bool,
}

/// LLM-backed question source. All calls go through the shared `LlmClient`.
pub struct LlmQuestionSource {
    llm: LlmClient,
}

impl LlmQuestionSource {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QuestionSource for LlmQuestionSource {
    async fn generate(
        &self,
        subject: &str,
        level: Level,
        prior_questions: &[Question],
    ) -> Result<Question, AppError> {
        let difficulty = level.difficulty();
        let prompt = build_question_prompt(subject, difficulty, prior_questions);
        let question: Question = self
            .llm
            .call_json(&prompt, &question_system())
            .await
            .map_err(|e| AppError::Llm(format!("question generation failed: {e}")))?;
        validate_question(question, level)
    }
}

/// Sanity-checks a source-produced question and pins its difficulty to the
/// requested level. Models occasionally mislabel difficulty or echo a
/// correct_option that isn't among the options; both would poison grading.
fn validate_question(mut question: Question, level: Level) -> Result<Question, AppError> {
    if question.prompt.trim().is_empty() {
        return Err(AppError::Llm("question has an empty prompt".to_string()));
    }
    if question.options.len() != 4 {
        return Err(AppError::Llm(format!(
            "question has {} options, expected 4",
            question.options.len()
        )));
    }
    if !question.options.contains(&question.correct_option) {
        return Err(AppError::Llm(
            "correct_option is not one of the options".to_string(),
        ));
    }
    question.difficulty = level.difficulty();
    Ok(question)
}

/// Fetches the next question within `timeout`, substituting a local fallback
/// question on timeout or source failure. Never fails: the degradation is
/// recorded in `used_fallback` (and the logs) only.
pub async fn fetch_with_fallback(
    source: &dyn QuestionSource,
    timeout: Duration,
    subject: &str,
    level: Level,
    prior_questions: &[Question],
) -> FetchedQuestion {
    match tokio::time::timeout(timeout, source.generate(subject, level, prior_questions)).await {
        Ok(Ok(question)) => FetchedQuestion {
            question,
            used_fallback: false,
        },
        Ok(Err(e)) => {
            warn!("question source failed for '{subject}' ({level:?}): {e}; using fallback");
            FetchedQuestion {
                question: fallback_question(subject, level),
                used_fallback: true,
            }
        }
        Err(_) => {
            warn!(
                "question source timed out after {}s for '{subject}' ({level:?}); using fallback",
                timeout.as_secs()
            );
            FetchedQuestion {
                question: fallback_question(subject, level),
                used_fallback: true,
            }
        }
    }
}
