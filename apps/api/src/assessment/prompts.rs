// All LLM prompt constants for the Assessment module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::assessment::{Difficulty, Question};

/// System prompt for question generation — enforces JSON-only output.
pub fn question_system() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} \
        You are an expert technical interviewer writing one multiple-choice \
        question at a time for a skill assessment."
    )
}

/// Question generation prompt template.
/// Replace `{subject}`, `{difficulty}`, and `{prior_section}` before sending.
const QUESTION_PROMPT_TEMPLATE: &str = r#"Write ONE multiple-choice question to assess a learner's knowledge of {subject} at {difficulty} difficulty.

Return a JSON object with this EXACT schema (no extra fields):
{
  "prompt": "The question text",
  "options": ["option A", "option B", "option C", "option D"],
  "correct_option": "option B",
  "explanation": "One or two sentences on why the correct option is correct",
  "difficulty": "{difficulty}"
}

Rules:
- Exactly 4 options.
- "correct_option" MUST be copied verbatim from "options".
- Distractors must be plausible, not jokes.
- The question must be answerable without external material.
- Difficulty calibration: "easy" tests recall of fundamentals, "medium" tests applied understanding, "hard" tests edge cases and internals.
{prior_section}"#;

/// Builds the full question-generation prompt, including previously asked
/// prompts as a do-not-repeat hint when there are any.
pub fn build_question_prompt(
    subject: &str,
    difficulty: Difficulty,
    prior_questions: &[Question],
) -> String {
    let difficulty_label = match difficulty {
        Difficulty::Easy => "easy",
        Difficulty::Medium => "medium",
        Difficulty::Hard => "hard",
    };

    let prior_section = if prior_questions.is_empty() {
        String::new()
    } else {
        let asked: Vec<String> = prior_questions
            .iter()
            .map(|q| format!("- {}", q.prompt))
            .collect();
        format!(
            "\nDo NOT repeat or trivially rephrase any of these already-asked questions:\n{}",
            asked.join("\n")
        )
    };

    QUESTION_PROMPT_TEMPLATE
        .replace("{subject}", subject)
        .replace("{difficulty}", difficulty_label)
        .replace("{prior_section}", &prior_section)
}
