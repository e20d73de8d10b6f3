//! Question-set loading contract and set-level lint.
//!
//! Loading happens before a session starts and may be async; the engine
//! itself only ever sees a fully loaded `QuestionSet`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::QuizError;
use crate::model::{QuestionKind, QuestionSet};

/// Supplies question sets by id.
#[async_trait]
pub trait QuestionSetLoader: Send + Sync {
    /// Load a question set.
    ///
    /// Implementations report a missing id as `QuizError::NotFound` wrapped
    /// in the returned error, so callers can downcast it.
    async fn load_question_set(&self, id: &str) -> anyhow::Result<QuestionSet>;

    /// Ids this loader can serve.
    async fn available_ids(&self) -> anyhow::Result<Vec<String>>;
}

/// A loader backed by sets held in memory. Useful for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLoader {
    sets: HashMap<String, QuestionSet>,
}

impl InMemoryLoader {
    pub fn new(sets: impl IntoIterator<Item = QuestionSet>) -> Self {
        Self {
            sets: sets.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn insert(&mut self, set: QuestionSet) {
        self.sets.insert(set.id.clone(), set);
    }
}

#[async_trait]
impl QuestionSetLoader for InMemoryLoader {
    async fn load_question_set(&self, id: &str) -> anyhow::Result<QuestionSet> {
        self.sets
            .get(id)
            .cloned()
            .ok_or_else(|| QuizError::set_not_found(id).into())
    }

    async fn available_ids(&self) -> anyhow::Result<Vec<String>> {
        let mut ids: Vec<String> = self.sets.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// A non-fatal issue found in a question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub question_id: Option<String>,
    pub message: String,
}

impl LintWarning {
    fn set(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            message: message.into(),
        }
    }

    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Check a set for issues that do not stop a session from running.
pub fn lint_question_set(set: &QuestionSet) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    if set.is_empty() {
        warnings.push(LintWarning::set("question set has no questions"));
    }

    let mut numbers = HashSet::new();
    for citation in &set.context {
        if !numbers.insert(citation.number) {
            warnings.push(LintWarning::set(format!(
                "duplicate citation number: {}",
                citation.number
            )));
        }
    }

    for question in &set.questions {
        if question.text.trim().is_empty() {
            warnings.push(LintWarning::question(&question.id, "question text is empty"));
        }

        if question.explanation.trim().is_empty() {
            warnings.push(LintWarning::question(&question.id, "no explanation provided"));
        }

        for number in &question.citations {
            if !numbers.contains(number) {
                warnings.push(LintWarning::question(
                    &question.id,
                    format!("citation {number} has no matching context entry"),
                ));
            }
        }

        if let QuestionKind::Matching { pairs } = &question.kind {
            if pairs.len() == 1 {
                warnings.push(LintWarning::question(
                    &question.id,
                    "matching question has a single pair",
                ));
            }
        }
    }

    warnings
}
