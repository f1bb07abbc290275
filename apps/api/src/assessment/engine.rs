//! Adaptive assessment engine — a plain session state machine.
//!
//! Host-independent by design: no async, no I/O, no axum types. The HTTP
//! layer and the question source are wired around it in `service.rs`, so the
//! whole quiz flow is testable with no server running.

use chrono::Utc;
use thiserror::Error;

use crate::models::assessment::{
    AnswerRecord, Level, Question, Report, SessionStatus, MAX_QUESTIONS,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssessmentError {
    #[error("assessment subject must not be empty")]
    InvalidStart,

    #[error("invalid answer submission: {0}")]
    InvalidAnswer(&'static str),

    #[error("assessment is already completed; start a new one")]
    SessionCompleted,

    #[error("a question is already loaded for this session")]
    QuestionAlreadyLoaded,
}

/// A question staged for answering, with its provenance flag.
#[derive(Debug, Clone)]
struct PendingQuestion {
    question: Question,
    used_fallback: bool,
}

/// Result of grading one submission. The revealed fields are what the
/// client gets to see only after answering.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub was_correct: bool,
    pub correct_option: String,
    pub explanation: String,
}

/// Read-side view of a session's counters for rendering.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressSnapshot {
    pub subject: Option<String>,
    pub status: SessionStatus,
    pub current_level: Level,
    pub question_index: u32,
    pub max_questions: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

impl ProgressSnapshot {
    /// Snapshot for a learner with no session on record.
    pub fn not_started() -> Self {
        ProgressSnapshot {
            subject: None,
            status: SessionStatus::NotStarted,
            current_level: Level::Beginner,
            question_index: 0,
            max_questions: MAX_QUESTIONS,
            correct_count: 0,
            incorrect_count: 0,
        }
    }
}

/// One 10-question adaptive quiz attempt for one subject.
///
/// Invariants held after every mutation:
/// - `correct_count + incorrect_count == question_index`
/// - `question_index <= MAX_QUESTIONS`
/// - status only moves forward; a completed session never mutates again
/// - every failed call is an atomic no-op
#[derive(Debug, Clone)]
pub struct Session {
    subject: String,
    status: SessionStatus,
    current_level: Level,
    question_index: u32,
    correct_count: u32,
    incorrect_count: u32,
    history: Vec<AnswerRecord>,
    pending: Option<PendingQuestion>,
    report: Option<Report>,
}

impl Session {
    /// Starts a fresh session for `subject`.
    ///
    /// A new assessment is always a new `Session` value — the engine never
    /// resurrects or rewinds a completed one.
    pub fn start(subject: &str) -> Result<Session, AssessmentError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AssessmentError::InvalidStart);
        }
        Ok(Session {
            subject: subject.to_string(),
            status: SessionStatus::InProgress,
            current_level: Level::Beginner,
            question_index: 0,
            correct_count: 0,
            incorrect_count: 0,
            history: Vec::with_capacity(MAX_QUESTIONS as usize),
            pending: None,
            report: None,
        })
    }

    /// Stages the next question for answering.
    pub fn load_question(
        &mut self,
        question: Question,
        used_fallback: bool,
    ) -> Result<(), AssessmentError> {
        if self.status == SessionStatus::Completed {
            return Err(AssessmentError::SessionCompleted);
        }
        if self.pending.is_some() {
            return Err(AssessmentError::QuestionAlreadyLoaded);
        }
        self.pending = Some(PendingQuestion {
            question,
            used_fallback,
        });
        Ok(())
    }

    /// Grades one submission against the loaded question.
    ///
    /// Level adaptation: every time `correct_count` becomes odd and the
    /// session is below expert, the level advances one step. Incorrect
    /// answers never move the level; there is no level-down.
    pub fn submit_answer(&mut self, selected: &str) -> Result<SubmitOutcome, AssessmentError> {
        if self.status == SessionStatus::Completed {
            return Err(AssessmentError::SessionCompleted);
        }
        if selected.is_empty() {
            return Err(AssessmentError::InvalidAnswer("selected option is empty"));
        }
        // Consuming the question is the last failure check, so a rejected
        // submission leaves the session untouched.
        let PendingQuestion {
            question,
            used_fallback,
        } = match self.pending.take() {
            Some(pending) => pending,
            None => {
                return Err(AssessmentError::InvalidAnswer(
                    "no question is currently loaded",
                ))
            }
        };

        let was_correct = selected == question.correct_option;
        let correct_option = question.correct_option.clone();
        let explanation = question.explanation.clone();

        self.history.push(AnswerRecord {
            question,
            submitted_answer: selected.to_string(),
            was_correct,
            used_fallback,
        });
        self.question_index += 1;
        if was_correct {
            self.correct_count += 1;
            if self.correct_count % 2 == 1 {
                self.current_level = self.current_level.next();
            }
        } else {
            self.incorrect_count += 1;
        }

        if self.question_index == MAX_QUESTIONS {
            self.status = SessionStatus::Completed;
            self.report = Some(self.compute_report());
        }

        Ok(SubmitOutcome {
            was_correct,
            correct_option,
            explanation,
        })
    }

    /// Builds the immutable report. Called exactly once, on completion.
    ///
    /// `level_reached` is re-derived from accuracy alone and is independent
    /// of the level the session climbed to during play. Both values ship in
    /// the report.
    fn compute_report(&self) -> Report {
        let answered = self.correct_count + self.incorrect_count;
        let accuracy_percent = if answered == 0 {
            0.0
        } else {
            100.0 * f64::from(self.correct_count) / f64::from(answered)
        };
        Report {
            subject: self.subject.clone(),
            final_level: self.current_level,
            total_questions: self.question_index,
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
            accuracy_percent,
            level_reached: Level::from_accuracy(accuracy_percent),
            completed_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_level(&self) -> Level {
        self.current_level
    }

    /// The question currently awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&Question> {
        self.pending.as_ref().map(|p| &p.question)
    }

    /// The final report. `None` until the 10th answer lands; stable after.
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    /// Questions asked so far, newest last. Passed to the question source
    /// as a dedup hint.
    pub fn asked_questions(&self) -> impl Iterator<Item = &Question> + '_ {
        self.history.iter().map(|r| &r.question)
    }

    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            subject: Some(self.subject.clone()),
            status: self.status,
            current_level: self.current_level,
            question_index: self.question_index,
            max_questions: MAX_QUESTIONS,
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
