//! Assessment service — per-learner session registry and quiz orchestration.
//!
//! Sessions are independent units: the registry map is the only shared state,
//! and each learner's session sits behind its own async mutex, which is held
//! across the question fetch. That serializes all mutation of one session and
//! guarantees at most one outstanding fetch per session, with no cross-session
//! coordination at all.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex as SessionLock;
use uuid::Uuid;

use crate::assessment::engine::{ProgressSnapshot, Session};
use crate::assessment::source::{fetch_with_fallback, QuestionSource};
use crate::errors::AppError;
use crate::models::assessment::{AnswerRecord, Question, QuestionView, Report, SessionStatus};

type SessionHandle = Arc<SessionLock<Session>>;

/// Response to a successful start: the fresh session plus its first question.
#[derive(Debug, Serialize)]
pub struct StartedAssessment {
    pub progress: ProgressSnapshot,
    pub question: QuestionView,
    /// True when the first question came from the local bank. Observability
    /// only — the flow is identical either way.
    pub question_from_fallback: bool,
}

/// Response to a graded answer: the reveal, the updated counters, and either
/// the next question or the final report.
#[derive(Debug, Serialize)]
pub struct AnswerOutcome {
    pub was_correct: bool,
    pub correct_option: String,
    pub explanation: String,
    pub progress: ProgressSnapshot,
    pub next_question: Option<QuestionView>,
    pub report: Option<Report>,
}

pub struct AssessmentService {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    source: Arc<dyn QuestionSource>,
    question_timeout: Duration,
}

impl AssessmentService {
    pub fn new(source: Arc<dyn QuestionSource>, question_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            source,
            question_timeout,
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Uuid, SessionHandle>> {
        self.sessions.lock().expect("session registry lock poisoned")
    }

    /// Starts a fresh assessment, replacing any previous session for this
    /// learner. An abandoned in-progress session is simply discarded — no
    /// partial report is produced for it.
    ///
    /// Validation happens before the replacement, so a rejected start leaves
    /// the learner's existing session untouched.
    pub async fn start(
        &self,
        learner_id: Uuid,
        subject: &str,
    ) -> Result<StartedAssessment, AppError> {
        let session = Session::start(subject)?;
        let handle: SessionHandle = Arc::new(SessionLock::new(session));
        self.registry().insert(learner_id, Arc::clone(&handle));

        let mut session = handle.lock().await;
        let fetched = fetch_with_fallback(
            self.source.as_ref(),
            self.question_timeout,
            session.subject(),
            session.current_level(),
            &[],
        )
        .await;
        let used_fallback = fetched.used_fallback;
        let question = QuestionView::from(&fetched.question);
        session.load_question(fetched.question, used_fallback)?;

        Ok(StartedAssessment {
            progress: session.progress(),
            question,
            question_from_fallback: used_fallback,
        })
    }

    /// Grades one answer and, unless the session just completed, loads the
    /// next question at the (possibly advanced) level.
    pub async fn answer(&self, learner_id: Uuid, selected: &str) -> Result<AnswerOutcome, AppError> {
        let handle = self.session_handle(learner_id)?;
        let mut session = handle.lock().await;

        let graded = session.submit_answer(selected)?;
        if session.status() == SessionStatus::Completed {
            return Ok(AnswerOutcome {
                was_correct: graded.was_correct,
                correct_option: graded.correct_option,
                explanation: graded.explanation,
                progress: session.progress(),
                next_question: None,
                report: session.report().cloned(),
            });
        }

        let prior: Vec<Question> = session.asked_questions().cloned().collect();
        let fetched = fetch_with_fallback(
            self.source.as_ref(),
            self.question_timeout,
            session.subject(),
            session.current_level(),
            &prior,
        )
        .await;
        let used_fallback = fetched.used_fallback;
        let next_question = QuestionView::from(&fetched.question);
        session.load_question(fetched.question, used_fallback)?;

        Ok(AnswerOutcome {
            was_correct: graded.was_correct,
            correct_option: graded.correct_option,
            explanation: graded.explanation,
            progress: session.progress(),
            next_question: Some(next_question),
            report: None,
        })
    }

    /// The question currently awaiting this learner's answer.
    pub async fn current_question(&self, learner_id: Uuid) -> Option<QuestionView> {
        let handle = self.registry().get(&learner_id).cloned()?;
        let session = handle.lock().await;
        session.current_question().map(QuestionView::from)
    }

    /// The final report — `None` until the session completes.
    pub async fn report(&self, learner_id: Uuid) -> Option<Report> {
        let handle = self.registry().get(&learner_id).cloned()?;
        let session = handle.lock().await;
        session.report().cloned()
    }

    /// Graded entries for the review screen, oldest first. Empty when the
    /// learner has no session on record.
    pub async fn history(&self, learner_id: Uuid) -> Vec<AnswerRecord> {
        let handle = self.registry().get(&learner_id).cloned();
        match handle {
            Some(handle) => handle.lock().await.history().to_vec(),
            None => Vec::new(),
        }
    }

    /// Counters for rendering. A learner with no session on record reads as
    /// a not-started snapshot rather than an error.
    pub async fn progress(&self, learner_id: Uuid) -> ProgressSnapshot {
        let handle = self.registry().get(&learner_id).cloned();
        match handle {
            Some(handle) => handle.lock().await.progress(),
            None => ProgressSnapshot::not_started(),
        }
    }

    /// Explicitly discards the learner's session. Returns whether one existed.
    pub fn reset(&self, learner_id: Uuid) -> bool {
        self.registry().remove(&learner_id).is_some()
    }

    fn session_handle(&self, learner_id: Uuid) -> Result<SessionHandle, AppError> {
        self.registry().get(&learner_id).cloned().ok_or_else(|| {
            AppError::NotFound("no active assessment for this learner".to_string())
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{Difficulty, Level, SessionStatus, MAX_QUESTIONS};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(8);

    /// Generates numbered questions whose correct option is always "right",
    /// and records the prior-question hint sizes it was given.
    struct CountingSource {
        calls: AtomicU32,
        prior_lens: Mutex<Vec<usize>>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                prior_lens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuestionSource for CountingSource {
        async fn generate(
            &self,
            subject: &str,
            level: Level,
            prior: &[Question],
        ) -> Result<Question, AppError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prior_lens.lock().unwrap().push(prior.len());
            Ok(Question {
                prompt: format!("{subject} question #{n}"),
                options: vec!["right".into(), "a".into(), "b".into(), "c".into()],
                correct_option: "right".to_string(),
                explanation: "because".to_string(),
                difficulty: level.difficulty(),
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl QuestionSource for FailingSource {
        async fn generate(
            &self,
            _subject: &str,
            _level: Level,
            _prior: &[Question],
        ) -> Result<Question, AppError> {
            Err(AppError::Llm("unavailable".to_string()))
        }
    }

    fn service(source: Arc<dyn QuestionSource>) -> AssessmentService {
        AssessmentService::new(source, TIMEOUT)
    }

    #[tokio::test]
    async fn test_start_returns_first_question_and_fresh_progress() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        let started = svc.start(learner, "Rust").await.unwrap();
        assert_eq!(started.progress.status, SessionStatus::InProgress);
        assert_eq!(started.progress.question_index, 0);
        assert_eq!(started.progress.current_level, Level::Beginner);
        assert!(started.question.prompt.contains("Rust"));
        assert!(!started.question_from_fallback);
    }

    #[tokio::test]
    async fn test_start_with_empty_subject_is_rejected() {
        let svc = service(Arc::new(CountingSource::new()));
        let err = svc.start(Uuid::new_v4(), "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_start_keeps_existing_session() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        svc.start(learner, "Rust").await.unwrap();
        svc.answer(learner, "right").await.unwrap();

        assert!(svc.start(learner, "").await.is_err());
        // The in-progress session survived the rejected start.
        let progress = svc.progress(learner).await;
        assert_eq!(progress.question_index, 1);
        assert_eq!(progress.subject.as_deref(), Some("Rust"));
    }

    #[tokio::test]
    async fn test_full_flow_completes_after_ten_answers() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        svc.start(learner, "JavaScript").await.unwrap();

        for i in 0..MAX_QUESTIONS {
            // Alternate correct and incorrect answers.
            let selected = if i % 2 == 0 { "right" } else { "a" };
            let outcome = svc.answer(learner, selected).await.unwrap();
            if i < MAX_QUESTIONS - 1 {
                assert!(outcome.next_question.is_some());
                assert!(outcome.report.is_none());
            } else {
                assert!(outcome.next_question.is_none());
                let report = outcome.report.expect("report on the 10th answer");
                assert_eq!(report.total_questions, 10);
                assert_eq!(report.correct_count, 5);
                assert_eq!(report.level_reached, Level::Intermediate);
            }
        }

        let report = svc.report(learner).await.expect("report readable after completion");
        assert_eq!(report.subject, "JavaScript");
        assert!((report.accuracy_percent - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_answer_after_completion_is_conflict() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        svc.start(learner, "SQL").await.unwrap();
        for _ in 0..MAX_QUESTIONS {
            svc.answer(learner, "right").await.unwrap();
        }
        let err = svc.answer(learner, "right").await.unwrap_err();
        assert!(matches!(err, AppError::SessionCompleted(_)));
    }

    #[tokio::test]
    async fn test_answer_without_session_is_not_found() {
        let svc = service(Arc::new(CountingSource::new()));
        let err = svc.answer(Uuid::new_v4(), "right").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_restart_discards_previous_session() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        svc.start(learner, "Rust").await.unwrap();
        for _ in 0..3 {
            svc.answer(learner, "right").await.unwrap();
        }
        // Mid-flight restart with a new subject: counters reset, no report
        // ever exists for the abandoned attempt.
        let started = svc.start(learner, "Python").await.unwrap();
        assert_eq!(started.progress.question_index, 0);
        assert_eq!(started.progress.subject.as_deref(), Some("Python"));
        assert!(svc.report(learner).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_independent_per_learner() {
        let svc = service(Arc::new(CountingSource::new()));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        svc.start(alice, "Rust").await.unwrap();
        svc.start(bob, "SQL").await.unwrap();
        svc.answer(alice, "right").await.unwrap();

        assert_eq!(svc.progress(alice).await.question_index, 1);
        assert_eq!(svc.progress(bob).await.question_index, 0);
    }

    #[tokio::test]
    async fn test_prior_question_hint_grows_with_history() {
        let source = Arc::new(CountingSource::new());
        let svc = service(Arc::clone(&source) as Arc<dyn QuestionSource>);
        let learner = Uuid::new_v4();
        svc.start(learner, "Rust").await.unwrap();
        svc.answer(learner, "right").await.unwrap();
        svc.answer(learner, "right").await.unwrap();
        // Fetches happen at start (0 prior) and after each non-final answer.
        assert_eq!(*source.prior_lens.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_source_failure_degrades_to_fallback_and_flow_continues() {
        let svc = service(Arc::new(FailingSource));
        let learner = Uuid::new_v4();
        let started = svc.start(learner, "Rust").await.unwrap();
        assert!(started.question_from_fallback);

        // The fallback question is fully gradable.
        let selected = started.question.options[0].clone();
        let outcome = svc.answer(learner, &selected).await.unwrap();
        assert_eq!(outcome.progress.question_index, 1);
        assert!(outcome.next_question.is_some());
    }

    #[tokio::test]
    async fn test_current_question_and_report_read_sides() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        assert!(svc.current_question(learner).await.is_none());
        assert!(svc.report(learner).await.is_none());

        svc.start(learner, "Rust").await.unwrap();
        assert!(svc.current_question(learner).await.is_some());
        assert!(svc.report(learner).await.is_none());
    }

    #[tokio::test]
    async fn test_history_tracks_graded_answers() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        assert!(svc.history(learner).await.is_empty());

        svc.start(learner, "Rust").await.unwrap();
        svc.answer(learner, "right").await.unwrap();
        svc.answer(learner, "a").await.unwrap();

        let history = svc.history(learner).await;
        assert_eq!(history.len(), 2);
        assert!(history[0].was_correct);
        assert!(!history[1].was_correct);
        assert!(!history[0].used_fallback);
    }

    #[tokio::test]
    async fn test_progress_for_unknown_learner_reads_not_started() {
        let svc = service(Arc::new(CountingSource::new()));
        let progress = svc.progress(Uuid::new_v4()).await;
        assert_eq!(progress.status, SessionStatus::NotStarted);
        assert_eq!(progress.question_index, 0);
        assert!(progress.subject.is_none());
    }

    #[tokio::test]
    async fn test_reset_discards_session() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        svc.start(learner, "Rust").await.unwrap();
        assert!(svc.reset(learner));
        assert!(!svc.reset(learner));
        assert!(svc.current_question(learner).await.is_none());
    }

    #[tokio::test]
    async fn test_level_adapts_upward_during_flow() {
        let svc = service(Arc::new(CountingSource::new()));
        let learner = Uuid::new_v4();
        svc.start(learner, "Rust").await.unwrap();
        let outcome = svc.answer(learner, "right").await.unwrap();
        assert_eq!(outcome.progress.current_level, Level::Intermediate);
        // The next question is requested at the new level.
        assert_eq!(
            outcome.next_question.unwrap().difficulty,
            Difficulty::Medium
        );
    }
}
