//! Session summaries with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluator::Correctness;
use crate::model::{Difficulty, QuestionSet};
use crate::session::SessionState;
use crate::statistics::SessionStats;

/// Snapshot of a session, one outcome per question in set order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub question_set_id: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Wall-clock seconds between start and end, once ended.
    #[serde(default)]
    pub duration_secs: Option<i64>,
    pub stats: SessionStats,
    pub outcomes: Vec<QuestionOutcome>,
}

/// How one question went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub kind: String,
    pub difficulty: Difficulty,
    /// `None` when the question was never answered.
    pub correctness: Option<Correctness>,
    #[serde(default)]
    pub time_spent: Option<f64>,
}

impl QuestionOutcome {
    pub fn is_answered(&self) -> bool {
        self.correctness.is_some()
    }
}

impl SessionSummary {
    pub fn from_session(set: &QuestionSet, state: &SessionState) -> Self {
        let outcomes = set
            .questions
            .iter()
            .map(|q| {
                let answer = state.user_answers.get(&q.id);
                QuestionOutcome {
                    question_id: q.id.clone(),
                    kind: q.kind.label().to_string(),
                    difficulty: q.difficulty,
                    correctness: answer.map(|a| a.correctness),
                    time_spent: answer.and_then(|a| a.time_spent),
                }
            })
            .collect();

        Self {
            session_id: state.session_id,
            question_set_id: state.question_set_id.clone(),
            topic: set.topic.clone(),
            started_at: state.start_time,
            ended_at: state.end_time,
            duration_secs: state
                .end_time
                .map(|end| (end - state.start_time).num_seconds()),
            stats: state.stats.clone(),
            outcomes,
        }
    }

    /// Outcomes that were answered incorrectly.
    pub fn missed(&self) -> impl Iterator<Item = &QuestionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.correctness == Some(Correctness::Incorrect))
    }

    /// Save the summary as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read summary from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse summary JSON")
    }

    /// Render the summary as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("# Session {}\n\n", self.question_set_id));
        if let Some(topic) = &self.topic {
            md.push_str(&format!("Topic: {topic}\n\n"));
        }
        md.push_str(&format!(
            "Answered {}/{} ({:.0}%), {} correct, {} incorrect\n\n",
            self.stats.answered_questions,
            self.stats.total_questions,
            self.stats.completion_percentage,
            self.stats.correct_answers,
            self.stats.incorrect_answers,
        ));
        md.push_str("| Question | Kind | Difficulty | Result |\n");
        md.push_str("|----------|------|------------|--------|\n");
        for o in &self.outcomes {
            let result = match o.correctness {
                Some(Correctness::Correct) => "correct",
                Some(Correctness::Incorrect) => "incorrect",
                Some(Correctness::NotApplicable) => "ungraded",
                None => "skipped",
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                o.question_id, o.kind, o.difficulty, result
            ));
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::{Answer, AnswerOption, Question, QuestionKind};
    use crate::session::SessionEngine;
    use crate::time::{fixed_now, Clock};

    fn finished_engine() -> SessionEngine {
        let set = QuestionSet::new(
            "report",
            vec![
                Question::new(
                    "q1",
                    "Pick b",
                    QuestionKind::MultipleChoice {
                        options: vec![
                            AnswerOption::new("a", "A", false),
                            AnswerOption::new("b", "B", true),
                        ],
                    },
                )
                .unwrap(),
                Question::new(
                    "q2",
                    "Pick a",
                    QuestionKind::MultipleChoice {
                        options: vec![
                            AnswerOption::new("a", "A", true),
                            AnswerOption::new("b", "B", false),
                        ],
                    },
                )
                .unwrap()
                .with_difficulty(Difficulty::Advanced),
                Question::new(
                    "q3",
                    "Skipped",
                    QuestionKind::ShortAnswer {
                        sample_answer: String::new(),
                    },
                )
                .unwrap(),
            ],
        )
        .unwrap()
        .with_topic("Letters");

        let mut engine = SessionEngine::new().with_clock(Clock::fixed(fixed_now()));
        engine.register_question_set(set).unwrap();
        engine.start_session("report").unwrap();
        engine
            .submit_answer("q1", Answer::text("b"), Some(2.0))
            .unwrap();
        engine
            .submit_answer("q2", Answer::text("b"), Some(3.0))
            .unwrap();
        engine.clock_mut().advance(Duration::seconds(75));
        engine.finish_session().unwrap();
        engine
    }

    #[test]
    fn summary_lists_every_question_in_order() {
        let summary = finished_engine().summary().unwrap();
        assert_eq!(summary.topic.as_deref(), Some("Letters"));
        assert_eq!(summary.duration_secs, Some(75));
        let ids: Vec<_> = summary.outcomes.iter().map(|o| o.question_id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2", "q3"]);
        assert!(!summary.outcomes[2].is_answered());
        assert_eq!(summary.missed().count(), 1);
        assert_eq!(summary.outcomes[1].difficulty, Difficulty::Advanced);
    }

    #[test]
    fn json_round_trip_through_file() {
        let summary = finished_engine().summary().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");
        summary.save_json(&path).unwrap();

        let loaded = SessionSummary::load_json(&path).unwrap();
        assert_eq!(loaded.session_id, summary.session_id);
        assert_eq!(loaded.stats, summary.stats);
    }

    #[test]
    fn markdown_marks_skipped_questions() {
        let md = finished_engine().summary().unwrap().to_markdown();
        assert!(md.contains("Topic: Letters"));
        assert!(md.contains("| q3 | short_answer | medium | skipped |"));
        assert!(md.contains("| q2 | multiple_choice | advanced | incorrect |"));
    }
}
