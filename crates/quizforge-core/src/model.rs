//! Core data model types for quizforge.
//!
//! A `QuestionSet` is an ordered list of `Question`s. Each question carries the
//! common fields plus a closed `QuestionKind` tagged union with the per-kind
//! correctness data. Shape rules are enforced by `Question::validate`, which
//! every constructor runs and which the engine re-runs on deserialized data.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::evaluator::{Correctness, EvaluationDetail, ALTERNATIVE_SEPARATOR};
use crate::layout::BlankTemplate;

/// How hard a question is meant to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    #[default]
    Medium,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Basic => write!(f, "basic"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

/// One selectable option of a multiple-choice or true/false question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct,
        }
    }
}

/// A left/right pair of a matching question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

impl MatchPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// The per-kind part of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<AnswerOption>,
    },
    /// Graded by a human; `sample_answer` is shown after submission.
    ShortAnswer {
        #[serde(default)]
        sample_answer: String,
    },
    TrueFalse {
        options: Vec<AnswerOption>,
    },
    /// `blanks[i]` holds the accepted answer(s) for the i-th marker in the text,
    /// with alternatives separated by `|`.
    FillInBlank {
        blanks: Vec<String>,
    },
    Matching {
        pairs: Vec<MatchPair>,
    },
}

impl QuestionKind {
    /// Stable snake_case label, matching the serde tag.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::ShortAnswer { .. } => "short_answer",
            QuestionKind::TrueFalse { .. } => "true_false",
            QuestionKind::FillInBlank { .. } => "fill_in_blank",
            QuestionKind::Matching { .. } => "matching",
        }
    }

    /// Whether answers to this kind receive a programmatic verdict.
    pub fn is_gradable(&self) -> bool {
        !matches!(self, QuestionKind::ShortAnswer { .. })
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single practice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within its question set.
    pub id: String,
    /// Prompt text. For fill-in-the-blank questions this contains the markers.
    pub text: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: String,
    /// Reference numbers into the owning set's `context`.
    #[serde(default)]
    pub citations: Vec<u32>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    /// Build a question and check its shape.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` naming the offending field.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        kind: QuestionKind,
    ) -> Result<Self, QuizError> {
        let question = Self {
            id: id.into(),
            text: text.into(),
            difficulty: Difficulty::default(),
            explanation: String::new(),
            citations: Vec::new(),
            kind,
        };
        question.validate()?;
        Ok(question)
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    #[must_use]
    pub fn with_citations(mut self, citations: Vec<u32>) -> Self {
        self.citations = citations;
        self
    }

    /// Check the per-kind shape rules.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.id.trim().is_empty() {
            return Err(QuizError::validation("id", "question id is empty"));
        }

        match &self.kind {
            QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
                validate_options(options)
            }
            QuestionKind::ShortAnswer { .. } => Ok(()),
            QuestionKind::FillInBlank { blanks } => {
                if blanks.is_empty() {
                    return Err(QuizError::validation(
                        "blanks",
                        "fill-in-the-blank question has no blanks",
                    ));
                }
                if let Some(i) = blanks.iter().position(|b| !has_alternative(b)) {
                    return Err(QuizError::validation(
                        "blanks",
                        format!("blank {} has no accepted answer", i + 1),
                    ));
                }
                BlankTemplate::parse(&self.text, blanks.len()).map(|_| ())
            }
            QuestionKind::Matching { pairs } => {
                if pairs.is_empty() {
                    return Err(QuizError::validation(
                        "pairs",
                        "matching question has no pairs",
                    ));
                }
                let mut seen = HashSet::new();
                for pair in pairs {
                    if pair.left.trim().is_empty() {
                        return Err(QuizError::validation("pairs.left", "left value is empty"));
                    }
                    if pair.right.trim().is_empty() {
                        return Err(QuizError::validation(
                            "pairs.right",
                            format!("right value for {} is empty", pair.left),
                        ));
                    }
                    if !seen.insert(pair.left.as_str()) {
                        return Err(QuizError::validation(
                            "pairs.left",
                            format!("duplicate left value: {}", pair.left),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// The correct option of a multiple-choice or true/false question.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        match &self.kind {
            QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
                options.iter().find(|o| o.is_correct)
            }
            _ => None,
        }
    }
}

fn validate_options(options: &[AnswerOption]) -> Result<(), QuizError> {
    if options.is_empty() {
        return Err(QuizError::validation("options", "question has no options"));
    }

    let mut seen = HashSet::new();
    for option in options {
        if option.id.trim().is_empty() {
            return Err(QuizError::validation("options.id", "option id is empty"));
        }
        if !seen.insert(option.id.as_str()) {
            return Err(QuizError::validation(
                "options.id",
                format!("duplicate option id: {}", option.id),
            ));
        }
    }

    match options.iter().filter(|o| o.is_correct).count() {
        1 => Ok(()),
        0 => Err(QuizError::validation(
            "options.is_correct",
            "no option is marked correct",
        )),
        n => Err(QuizError::validation(
            "options.is_correct",
            format!("exactly one option must be correct, found {n}"),
        )),
    }
}

/// Whether an accepted-answer string has at least one non-empty alternative.
fn has_alternative(accepted: &str) -> bool {
    accepted
        .split(ALTERNATIVE_SEPARATOR)
        .any(|alt| !alt.trim().is_empty())
}

/// Supporting material a question can cite by number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// An ordered collection of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Citation materials, looked up by `Citation::number`.
    #[serde(default)]
    pub context: Vec<Citation>,
}

impl QuestionSet {
    /// Build a question set, checking every question and id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` for the first malformed question.
    pub fn new(id: impl Into<String>, questions: Vec<Question>) -> Result<Self, QuizError> {
        let set = Self {
            id: id.into(),
            topic: None,
            questions,
            context: Vec::new(),
        };
        set.validate()?;
        Ok(set)
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Vec<Citation>) -> Self {
        self.context = context;
        self
    }

    /// Validate the whole set: its id, every question, and question-id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` for the first problem found.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.id.trim().is_empty() {
            return Err(QuizError::validation("id", "question set id is empty"));
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(QuizError::validation(
                    "id",
                    format!("duplicate question id: {}", question.id),
                ));
            }
            question.validate().map_err(|e| match e {
                QuizError::Validation { field, message } => QuizError::Validation {
                    field: format!("questions[{}].{field}", question.id),
                    message,
                },
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    pub fn citation(&self, number: u32) -> Option<&Citation> {
        self.context.iter().find(|c| c.number == number)
    }
}

/// A candidate answer. The shape depends on the question kind:
/// text for choice and short-answer questions, a list for blanks, and a
/// left → right mapping for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    List(Vec<String>),
    Mapping(BTreeMap<String, String>),
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::List(items.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Answer::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Answer::Text(_) => "text",
            Answer::List(_) => "list",
            Answer::Mapping(_) => "mapping",
        }
    }
}

/// A recorded submission for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: String,
    /// The answer as graded (trimmed, restricted to known keys).
    pub answer: Answer,
    pub correctness: Correctness,
    #[serde(default)]
    pub detail: EvaluationDetail,
    /// Seconds spent on the question, if the caller measured it.
    #[serde(default)]
    pub time_spent: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

impl UserAnswer {
    /// `Some(true/false)` for graded kinds, `None` for short answers.
    pub fn is_correct(&self) -> Option<bool> {
        self.correctness.as_bool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mc_options() -> Vec<AnswerOption> {
        vec![
            AnswerOption::new("a", "Lyon", false),
            AnswerOption::new("b", "Paris", true),
            AnswerOption::new("c", "Nice", false),
        ]
    }

    #[test]
    fn difficulty_display_and_serde() {
        assert_eq!(Difficulty::Basic.to_string(), "basic");
        let parsed: Difficulty = serde_json::from_str(r#""advanced""#).unwrap();
        assert_eq!(parsed, Difficulty::Advanced);
        assert!(serde_json::from_str::<Difficulty>(r#""impossible""#).is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn multiple_choice_requires_exactly_one_correct() {
        assert!(Question::new(
            "q1",
            "Capital of France?",
            QuestionKind::MultipleChoice {
                options: mc_options()
            }
        )
        .is_ok());

        let none = vec![
            AnswerOption::new("a", "Lyon", false),
            AnswerOption::new("b", "Paris", false),
        ];
        let err = Question::new("q1", "?", QuestionKind::MultipleChoice { options: none })
            .unwrap_err();
        assert_eq!(err.field(), Some("options.is_correct"));

        let two = vec![
            AnswerOption::new("t", "True", true),
            AnswerOption::new("f", "False", true),
        ];
        let err = Question::new("q2", "?", QuestionKind::TrueFalse { options: two }).unwrap_err();
        assert_eq!(err.field(), Some("options.is_correct"));
    }

    #[test]
    fn duplicate_option_ids_rejected() {
        let options = vec![
            AnswerOption::new("a", "One", true),
            AnswerOption::new("a", "Two", false),
        ];
        let err = Question::new("q1", "?", QuestionKind::MultipleChoice { options }).unwrap_err();
        assert_eq!(err.field(), Some("options.id"));
    }

    #[test]
    fn fill_in_blank_marker_count_must_match() {
        let ok = Question::new(
            "q1",
            "The capital of France is ___ and of Italy is _____.",
            QuestionKind::FillInBlank {
                blanks: vec!["Paris".into(), "Rome".into()],
            },
        );
        assert!(ok.is_ok());

        let err = Question::new(
            "q1",
            "The capital of France is ___.",
            QuestionKind::FillInBlank {
                blanks: vec!["Paris".into(), "Rome".into()],
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("blanks"));
    }

    #[test]
    fn matching_left_values_unique() {
        let err = Question::new(
            "q1",
            "Match",
            QuestionKind::Matching {
                pairs: vec![MatchPair::new("A", "1"), MatchPair::new("A", "2")],
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("pairs.left"));

        let err = Question::new("q1", "Match", QuestionKind::Matching { pairs: vec![] })
            .unwrap_err();
        assert_eq!(err.field(), Some("pairs"));
    }

    #[test]
    fn empty_option_id_rejected() {
        let options = vec![
            AnswerOption::new(" ", "Paris", true),
            AnswerOption::new("b", "Lyon", false),
        ];
        let err = Question::new("q1", "?", QuestionKind::MultipleChoice { options }).unwrap_err();
        assert_eq!(err.field(), Some("options.id"));
    }

    #[test]
    fn blank_without_accepted_answer_rejected() {
        for accepted in ["", "|", " | "] {
            let err = Question::new(
                "q1",
                "Fill ___ in.",
                QuestionKind::FillInBlank {
                    blanks: vec![accepted.into()],
                },
            )
            .unwrap_err();
            assert_eq!(err.field(), Some("blanks"), "accepted = {accepted:?}");
        }

        assert!(Question::new(
            "q1",
            "Fill ___ in.",
            QuestionKind::FillInBlank {
                blanks: vec!["|this".into()],
            },
        )
        .is_ok());
    }

    #[test]
    fn empty_matching_values_rejected() {
        let err = Question::new(
            "q1",
            "Match",
            QuestionKind::Matching {
                pairs: vec![MatchPair::new("", "1")],
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("pairs.left"));

        let err = Question::new(
            "q1",
            "Match",
            QuestionKind::Matching {
                pairs: vec![MatchPair::new("A", "  ")],
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("pairs.right"));
    }

    #[test]
    fn question_set_rejects_duplicate_ids() {
        let q = Question::new(
            "dup",
            "Say something",
            QuestionKind::ShortAnswer {
                sample_answer: String::new(),
            },
        )
        .unwrap();
        let err = QuestionSet::new("set", vec![q.clone(), q]).unwrap_err();
        assert_eq!(err.field(), Some("id"));
    }

    #[test]
    fn question_set_prefixes_nested_field() {
        let bad = Question {
            id: "q7".into(),
            text: "no markers here".into(),
            difficulty: Difficulty::Basic,
            explanation: String::new(),
            citations: vec![],
            kind: QuestionKind::FillInBlank {
                blanks: vec!["x".into()],
            },
        };
        let err = QuestionSet::new("set", vec![bad]).unwrap_err();
        assert_eq!(err.field(), Some("questions[q7].blanks"));
    }

    #[test]
    fn question_json_uses_type_tag() {
        let json = r#"{
            "id": "q1",
            "text": "Capital of France?",
            "difficulty": "basic",
            "citations": [1, 3],
            "type": "multiple_choice",
            "options": [
                {"id": "a", "text": "Lyon"},
                {"id": "b", "text": "Paris", "is_correct": true}
            ]
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind.label(), "multiple_choice");
        assert_eq!(q.difficulty, Difficulty::Basic);
        assert_eq!(q.citations, vec![1, 3]);
        assert_eq!(q.correct_option().unwrap().id, "b");
        q.validate().unwrap();
    }

    #[test]
    fn answer_shapes_deserialize_untagged() {
        let text: Answer = serde_json::from_str(r#""b""#).unwrap();
        assert_eq!(text, Answer::text("b"));
        let list: Answer = serde_json::from_str(r#"["Paris", "Rome"]"#).unwrap();
        assert_eq!(list, Answer::list(["Paris", "Rome"]));
        let map: Answer = serde_json::from_str(r#"{"A": "1"}"#).unwrap();
        assert_eq!(map, Answer::mapping([("A", "1")]));
        assert_eq!(map.shape(), "mapping");
    }

    #[test]
    fn citation_lookup_by_number() {
        let set = QuestionSet::new("set", vec![]).unwrap().with_context(vec![Citation {
            number: 2,
            title: "Atlas".into(),
            content: "Paris is the capital.".into(),
            url: None,
        }]);
        assert_eq!(set.citation(2).unwrap().title, "Atlas");
        assert!(set.citation(1).is_none());
        assert!(set.is_empty());
    }
}
