use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of questions in every assessment. Intentionally a constant —
/// variable-length assessments would invalidate the report thresholds.
pub const MAX_QUESTIONS: u32 = 10;

/// Difficulty tier of a single question, as requested from the question
/// source. Three tiers on the question side, four on the session side —
/// see [`Level::difficulty`] for the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Learner proficiency level. Ordered: a session only ever moves up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Level {
    /// The next level up, saturating at `Expert`.
    pub fn next(self) -> Level {
        match self {
            Level::Beginner => Level::Intermediate,
            Level::Intermediate => Level::Advanced,
            Level::Advanced => Level::Expert,
            Level::Expert => Level::Expert,
        }
    }

    /// Question difficulty requested for a session at this level.
    pub fn difficulty(self) -> Difficulty {
        match self {
            Level::Beginner => Difficulty::Easy,
            Level::Intermediate => Difficulty::Medium,
            Level::Advanced | Level::Expert => Difficulty::Hard,
        }
    }

    /// Post-hoc mastery classification from final accuracy.
    ///
    /// NOTE: this is a different rule from the in-session level-up rule
    /// (every second cumulative correct answer). Both rules are kept on
    /// purpose; the report carries both values. See DESIGN.md.
    pub fn from_accuracy(accuracy_percent: f64) -> Level {
        if accuracy_percent >= 90.0 {
            Level::Expert
        } else if accuracy_percent >= 70.0 {
            Level::Advanced
        } else if accuracy_percent >= 50.0 {
            Level::Intermediate
        } else {
            Level::Beginner
        }
    }
}

/// One multiple-choice question as produced by the question source.
///
/// The engine treats everything here as opaque except `correct_option`,
/// which it compares against the learner's submission by exact text match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: String,
    pub explanation: String,
    pub difficulty: Difficulty,
}

/// Client-facing projection of a [`Question`].
///
/// Never includes `correct_option` or `explanation` — answers are graded
/// server-side and revealed only in the answer response, so the correctness
/// path stays entirely local to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub prompt: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        QuestionView {
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            difficulty: q.difficulty,
        }
    }
}

/// One graded entry in a session's history.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub question: Question,
    pub submitted_answer: String,
    pub was_correct: bool,
    /// True when the question came from the local fallback bank instead of
    /// the question source. Observability only — grading is identical.
    pub used_fallback: bool,
}

/// Lifecycle of a session. Transitions are strictly forward; a new
/// assessment is a fresh session, never a resurrected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Immutable summary of a completed session.
///
/// `final_level` is the level the session reached during play;
/// `level_reached` is re-derived from accuracy alone. They disagree by
/// construction for some answer sequences — both are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub subject: String,
    pub final_level: Level,
    pub total_questions: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub accuracy_percent: f64,
    pub level_reached: Level,
    pub completed_at: DateTime<Utc>,
}
