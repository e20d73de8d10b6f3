//! Session statistics.
//!
//! Everything here is a pure function of the question set and the recorded
//! answers; the engine recomputes it after every mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::evaluator::Correctness;
use crate::model::{QuestionSet, UserAnswer};

/// Aggregate progress and accuracy for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// Percentage of answered questions, 0–100.
    pub completion_percentage: f64,
    /// Percentage of graded answers that were correct, 0–100.
    pub accuracy_percentage: f64,
    /// Mean seconds per answered question, over answers that carry timing.
    pub average_time_per_question: f64,
}

impl SessionStats {
    /// Answers that received no programmatic verdict.
    pub fn ungraded_answers(&self) -> usize {
        self.answered_questions
            .saturating_sub(self.correct_answers)
            .saturating_sub(self.incorrect_answers)
    }

    pub fn remaining_questions(&self) -> usize {
        self.total_questions.saturating_sub(self.answered_questions)
    }
}

/// Compute statistics for `answers` recorded against `set`.
pub fn compute_stats(set: &QuestionSet, answers: &HashMap<String, UserAnswer>) -> SessionStats {
    let total_questions = set.len();
    let answered_questions = answers.len();

    let correct_answers = answers
        .values()
        .filter(|a| a.correctness == Correctness::Correct)
        .count();
    let incorrect_answers = answers
        .values()
        .filter(|a| a.correctness == Correctness::Incorrect)
        .count();

    let completion_percentage = percentage(answered_questions, total_questions);
    let accuracy_percentage = percentage(correct_answers, correct_answers + incorrect_answers);

    let timings: Vec<f64> = answers.values().filter_map(|a| a.time_spent).collect();
    let average_time_per_question = if timings.is_empty() {
        0.0
    } else {
        timings.iter().sum::<f64>() / timings.len() as f64
    };

    SessionStats {
        total_questions,
        answered_questions,
        correct_answers,
        incorrect_answers,
        completion_percentage,
        accuracy_percentage,
        average_time_per_question,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    100.0 * part as f64 / whole as f64
}
