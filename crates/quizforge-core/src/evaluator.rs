//! Answer grading.
//!
//! `evaluate` is a pure function of a question and a candidate answer. It
//! matches exhaustively on `QuestionKind`, so a new kind cannot be added
//! without a grading rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{Answer, AnswerOption, MatchPair, Question, QuestionKind};

/// Separator between alternatives in an accepted blank answer.
pub const ALTERNATIVE_SEPARATOR: char = '|';

/// Verdict for a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correctness {
    Correct,
    Incorrect,
    /// Subjective kinds (short answer) get no programmatic verdict.
    NotApplicable,
}

impl Correctness {
    pub fn from_bool(correct: bool) -> Self {
        if correct {
            Correctness::Correct
        } else {
            Correctness::Incorrect
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Correctness::Correct => Some(true),
            Correctness::Incorrect => Some(false),
            Correctness::NotApplicable => None,
        }
    }
}

/// Per-left outcome of a matching answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub left: String,
    pub expected: String,
    pub chosen: Option<String>,
    pub correct: bool,
}

/// Partial-credit detail beyond the aggregate verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationDetail {
    #[default]
    None,
    /// One entry per blank, in text order.
    Blanks { results: Vec<bool> },
    /// One entry per pair, in authored order.
    Matches { results: Vec<MatchResult> },
}

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correctness: Correctness,
    pub normalized_answer: Answer,
    pub detail: EvaluationDetail,
}

/// Grade `answer` against `question`.
///
/// # Errors
///
/// Returns `QuizError::Validation` on field `answer` when the payload shape
/// does not fit the question kind, or when a blank list has the wrong length.
pub fn evaluate(question: &Question, answer: &Answer) -> Result<Evaluation, QuizError> {
    match &question.kind {
        QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
            let Answer::Text(choice) = answer else {
                return Err(shape_mismatch("option id (text)", answer));
            };
            evaluate_choice(options, choice)
        }
        QuestionKind::ShortAnswer { .. } => {
            let Answer::Text(text) = answer else {
                return Err(shape_mismatch("text", answer));
            };
            Ok(Evaluation {
                correctness: Correctness::NotApplicable,
                normalized_answer: Answer::Text(text.trim().to_string()),
                detail: EvaluationDetail::None,
            })
        }
        QuestionKind::FillInBlank { blanks } => {
            let Answer::List(candidates) = answer else {
                return Err(shape_mismatch("list of blank answers", answer));
            };
            evaluate_blanks(blanks, candidates)
        }
        QuestionKind::Matching { pairs } => {
            let Answer::Mapping(mapping) = answer else {
                return Err(shape_mismatch("left-to-right mapping", answer));
            };
            Ok(evaluate_matching(pairs, mapping))
        }
    }
}

fn shape_mismatch(expected: &str, got: &Answer) -> QuizError {
    QuizError::validation(
        "answer",
        format!("expected {expected}, got {}", got.shape()),
    )
}

fn evaluate_choice(options: &[AnswerOption], choice: &str) -> Result<Evaluation, QuizError> {
    let correct = options
        .iter()
        .find(|o| o.is_correct)
        .ok_or_else(|| QuizError::validation("options.is_correct", "no option is marked correct"))?;

    let choice = choice.trim();
    let is_correct = !choice.is_empty() && choice == correct.id;

    Ok(Evaluation {
        correctness: Correctness::from_bool(is_correct),
        normalized_answer: Answer::Text(choice.to_string()),
        detail: EvaluationDetail::None,
    })
}

fn evaluate_blanks(accepted: &[String], candidates: &[String]) -> Result<Evaluation, QuizError> {
    if candidates.len() != accepted.len() {
        return Err(QuizError::validation(
            "answer",
            format!(
                "expected {} blank answer(s), got {}",
                accepted.len(),
                candidates.len()
            ),
        ));
    }

    let results: Vec<bool> = accepted
        .iter()
        .zip(candidates)
        .map(|(accepted, candidate)| blank_matches(accepted, candidate))
        .collect();

    Ok(Evaluation {
        correctness: Correctness::from_bool(results.iter().all(|&ok| ok)),
        normalized_answer: Answer::List(candidates.iter().map(|c| c.trim().to_string()).collect()),
        detail: EvaluationDetail::Blanks { results },
    })
}

/// Trimmed, case-insensitive comparison against every `|`-separated alternative.
/// Empty candidates never match.
pub fn blank_matches(accepted: &str, candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }
    let candidate = candidate.to_lowercase();
    accepted
        .split(ALTERNATIVE_SEPARATOR)
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .any(|alt| alt.to_lowercase() == candidate)
}

fn evaluate_matching(pairs: &[MatchPair], mapping: &BTreeMap<String, String>) -> Evaluation {
    let mut normalized = BTreeMap::new();
    let results: Vec<MatchResult> = pairs
        .iter()
        .map(|pair| {
            let chosen = mapping
                .get(&pair.left)
                .map(|right| right.trim())
                .filter(|right| !right.is_empty())
                .map(str::to_string);
            if let Some(right) = &chosen {
                normalized.insert(pair.left.clone(), right.clone());
            }
            let correct = chosen.as_deref() == Some(pair.right.trim());
            MatchResult {
                left: pair.left.clone(),
                expected: pair.right.clone(),
                chosen,
                correct,
            }
        })
        .collect();

    Evaluation {
        correctness: Correctness::from_bool(results.iter().all(|r| r.correct)),
        normalized_answer: Answer::Mapping(normalized),
        detail: EvaluationDetail::Matches { results },
    }
}
