//! The practice session state machine.
//!
//! A `SessionEngine` owns a catalog of registered question sets and at most
//! one live session. Phases run `Uninitialized → Active → Completed`; only
//! `Active` accepts submissions and navigation. Every operation either fully
//! applies or leaves the session untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::evaluator::evaluate;
use crate::layout::QuestionLayout;
use crate::loader::lint_question_set;
use crate::model::{Answer, Citation, Question, QuestionSet, UserAnswer};
use crate::report::SessionSummary;
use crate::statistics::{compute_stats, SessionStats};
use crate::time::Clock;

/// Lifecycle phase of the engine's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Completed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Uninitialized => write!(f, "uninitialized"),
            SessionPhase::Active => write!(f, "active"),
            SessionPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Engine behavior switches.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Shuffle matching right values at session start.
    pub shuffle_matching: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            shuffle_matching: true,
        }
    }
}

/// Observable state of a session. Callers only ever see it by shared
/// reference; the engine's operations are the only way to change it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub question_set_id: String,
    /// Always within `0..total_questions`.
    pub current_question_index: usize,
    pub user_answers: HashMap<String, UserAnswer>,
    /// Derived from `user_answers`; recomputed on every submission.
    pub stats: SessionStats,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

struct LiveSession {
    set: Arc<QuestionSet>,
    /// Aligned with `set.questions`.
    layouts: Vec<QuestionLayout>,
    state: SessionState,
}

impl LiveSession {
    fn phase(&self) -> SessionPhase {
        if self.state.end_time.is_some() {
            SessionPhase::Completed
        } else {
            SessionPhase::Active
        }
    }

    fn last_index(&self) -> usize {
        self.set.len().saturating_sub(1)
    }
}

/// Owns the question-set catalog and the single live session.
pub struct SessionEngine {
    catalog: HashMap<String, Arc<QuestionSet>>,
    session: Option<LiveSession>,
    options: EngineOptions,
    clock: Clock,
    rng: StdRng,
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEngine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            catalog: HashMap::new(),
            session: None,
            options,
            clock: Clock::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the shuffle source for reproducible layouts.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    /// Add a loaded question set to the catalog, replacing any set with the
    /// same id. A live session keeps the snapshot it started with.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` if the set is malformed.
    pub fn register_question_set(&mut self, set: QuestionSet) -> Result<(), QuizError> {
        set.validate()?;
        for warning in lint_question_set(&set) {
            tracing::warn!(
                question_set_id = %set.id,
                question_id = warning.question_id.as_deref().unwrap_or("-"),
                "{}",
                warning.message
            );
        }
        tracing::debug!(question_set_id = %set.id, questions = set.len(), "registered question set");
        self.catalog.insert(set.id.clone(), Arc::new(set));
        Ok(())
    }

    pub fn question_set(&self, id: &str) -> Option<&QuestionSet> {
        self.catalog.get(id).map(|s| s.as_ref())
    }

    /// Registered set ids, sorted.
    pub fn question_set_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.catalog.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::Uninitialized, LiveSession::phase)
    }

    /// Start a session on a registered set, replacing any prior session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` if the set is not registered, or
    /// `QuizError::Validation` if it has no questions.
    pub fn start_session(&mut self, question_set_id: &str) -> Result<&SessionState, QuizError> {
        let set = self
            .catalog
            .get(question_set_id)
            .cloned()
            .ok_or_else(|| QuizError::set_not_found(question_set_id))?;

        if set.is_empty() {
            return Err(QuizError::validation(
                "questions",
                format!("question set {question_set_id} has no questions"),
            ));
        }

        let layouts = set
            .questions
            .iter()
            .map(|q| QuestionLayout::derive(q, &mut self.rng, self.options.shuffle_matching))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(prior) = &self.session {
            tracing::debug!(
                session_id = %prior.state.session_id,
                "replacing existing session"
            );
        }

        let user_answers = HashMap::new();
        let state = SessionState {
            session_id: Uuid::new_v4(),
            question_set_id: set.id.clone(),
            current_question_index: 0,
            stats: compute_stats(&set, &user_answers),
            user_answers,
            start_time: self.clock.now(),
            end_time: None,
        };

        tracing::info!(
            session_id = %state.session_id,
            question_set_id = %state.question_set_id,
            questions = set.len(),
            "session started"
        );

        let live = self.session.insert(LiveSession {
            set,
            layouts,
            state,
        });
        Ok(&live.state)
    }

    /// Grade and record an answer. A question is recorded at most once:
    /// resubmitting returns the first recorded answer unchanged.
    ///
    /// `time_spent` is in seconds and must be finite and non-negative.
    ///
    /// # Errors
    ///
    /// - `QuizError::State` unless the session is `Active`.
    /// - `QuizError::NotFound` if the question is not in the active set.
    /// - `QuizError::Validation` if the answer shape or timing is invalid.
    pub fn submit_answer(
        &mut self,
        question_id: &str,
        answer: Answer,
        time_spent: Option<f64>,
    ) -> Result<&UserAnswer, QuizError> {
        let now = self.clock.now();
        let live = Self::require_active(&mut self.session, "submit an answer")?;

        let index = live
            .set
            .position(question_id)
            .ok_or_else(|| QuizError::question_not_found(question_id))?;

        if live.state.user_answers.contains_key(question_id) {
            tracing::debug!(
                session_id = %live.state.session_id,
                question_id,
                "question already answered, keeping first submission"
            );
            return live
                .state
                .user_answers
                .get(question_id)
                .ok_or_else(|| QuizError::question_not_found(question_id));
        }

        if let Some(secs) = time_spent {
            if !secs.is_finite() || secs < 0.0 {
                return Err(QuizError::validation(
                    "time_spent",
                    format!("expected a non-negative number of seconds, got {secs}"),
                ));
            }
        }

        let evaluation = evaluate(&live.set.questions[index], &answer)?;

        tracing::debug!(
            session_id = %live.state.session_id,
            question_id,
            correctness = ?evaluation.correctness,
            "answer recorded"
        );

        live.state.user_answers.insert(
            question_id.to_string(),
            UserAnswer {
                question_id: question_id.to_string(),
                answer: evaluation.normalized_answer,
                correctness: evaluation.correctness,
                detail: evaluation.detail,
                time_spent,
                submitted_at: now,
            },
        );
        live.state.stats = compute_stats(&live.set, &live.state.user_answers);

        if live.state.stats.answered_questions == live.state.stats.total_questions {
            live.state.end_time = Some(now);
            tracing::info!(
                session_id = %live.state.session_id,
                correct = live.state.stats.correct_answers,
                total = live.state.stats.total_questions,
                "all questions answered, session completed"
            );
        }

        live.state
            .user_answers
            .get(question_id)
            .ok_or_else(|| QuizError::question_not_found(question_id))
    }

    /// Move to the next question. No-op on the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::State` unless the session is `Active`.
    pub fn next_question(&mut self) -> Result<usize, QuizError> {
        let live = Self::require_active(&mut self.session, "move to the next question")?;
        let target = (live.state.current_question_index + 1).min(live.last_index());
        Ok(Self::move_to(live, target))
    }

    /// Move to the previous question. No-op on the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::State` unless the session is `Active`.
    pub fn previous_question(&mut self) -> Result<usize, QuizError> {
        let live = Self::require_active(&mut self.session, "move to the previous question")?;
        let target = live.state.current_question_index.saturating_sub(1);
        Ok(Self::move_to(live, target))
    }

    /// Jump to `index`, clamped into range.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::State` unless the session is `Active`.
    pub fn jump_to_question(&mut self, index: usize) -> Result<usize, QuizError> {
        let live = Self::require_active(&mut self.session, "jump to a question")?;
        let target = index.min(live.last_index());
        Ok(Self::move_to(live, target))
    }

    /// End the session early or after the last answer. Returns the end time.
    /// Calling it on a completed session returns the existing end time.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::State` if no session has been started.
    pub fn finish_session(&mut self) -> Result<DateTime<Utc>, QuizError> {
        let now = self.clock.now();
        let live = self.session.as_mut().ok_or(QuizError::State {
            operation: "finish the session",
            phase: SessionPhase::Uninitialized,
        })?;

        if let Some(end) = live.state.end_time {
            return Ok(end);
        }

        live.state.end_time = Some(now);
        tracing::info!(
            session_id = %live.state.session_id,
            answered = live.state.stats.answered_questions,
            total = live.state.stats.total_questions,
            "session finished"
        );
        Ok(now)
    }

    /// Alias of [`finish_session`](Self::finish_session).
    ///
    /// # Errors
    ///
    /// Returns `QuizError::State` if no session has been started.
    pub fn end_session(&mut self) -> Result<DateTime<Utc>, QuizError> {
        self.finish_session()
    }

    /// Discard the session and return to `Uninitialized`. Always succeeds.
    /// The catalog is kept.
    pub fn reset_session(&mut self) {
        if let Some(live) = self.session.take() {
            tracing::info!(session_id = %live.state.session_id, "session reset");
        }
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> Option<&SessionState> {
        self.session.as_ref().map(|s| &s.state)
    }

    pub fn stats(&self) -> Option<&SessionStats> {
        self.state().map(|s| &s.stats)
    }

    /// The question set the live session runs on.
    pub fn active_question_set(&self) -> Option<&QuestionSet> {
        self.session.as_ref().map(|s| s.set.as_ref())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state().map(|s| s.current_question_index)
    }

    pub fn current_question(&self) -> Option<&Question> {
        let live = self.session.as_ref()?;
        live.set.questions.get(live.state.current_question_index)
    }

    pub fn current_layout(&self) -> Option<&QuestionLayout> {
        let live = self.session.as_ref()?;
        live.layouts.get(live.state.current_question_index)
    }

    pub fn current_user_answer(&self) -> Option<&UserAnswer> {
        let question = self.current_question()?;
        self.user_answer(&question.id)
    }

    pub fn layout(&self, question_id: &str) -> Option<&QuestionLayout> {
        let live = self.session.as_ref()?;
        let index = live.set.position(question_id)?;
        live.layouts.get(index)
    }

    pub fn user_answer(&self, question_id: &str) -> Option<&UserAnswer> {
        self.state()?.user_answers.get(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.user_answer(question_id).is_some()
    }

    /// Resolve a question's citation numbers against the active set's
    /// context. Unknown numbers are skipped.
    pub fn citations_for(&self, question: &Question) -> Vec<&Citation> {
        let Some(set) = self.active_question_set() else {
            return Vec::new();
        };
        question
            .citations
            .iter()
            .filter_map(|&n| set.citation(n))
            .collect()
    }

    /// Snapshot of the live session for reporting.
    pub fn summary(&self) -> Option<SessionSummary> {
        let live = self.session.as_ref()?;
        Some(SessionSummary::from_session(&live.set, &live.state))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_active<'a>(
        session: &'a mut Option<LiveSession>,
        operation: &'static str,
    ) -> Result<&'a mut LiveSession, QuizError> {
        match session {
            Some(live) => {
                let phase = live.phase();
                if phase == SessionPhase::Active {
                    Ok(live)
                } else {
                    Err(QuizError::State { operation, phase })
                }
            }
            None => Err(QuizError::State {
                operation,
                phase: SessionPhase::Uninitialized,
            }),
        }
    }

    fn move_to(live: &mut LiveSession, target: usize) -> usize {
        if target != live.state.current_question_index {
            tracing::debug!(
                session_id = %live.state.session_id,
                from = live.state.current_question_index,
                to = target,
                "navigated"
            );
            live.state.current_question_index = target;
        }
        target
    }
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("catalog", &self.question_set_ids())
            .field("phase", &self.phase())
            .field("session_id", &self.state().map(|s| s.session_id))
            .field("options", &self.options)
            .finish()
    }
}
