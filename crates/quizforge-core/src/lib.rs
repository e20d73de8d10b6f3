//! quizforge-core: practice question session engine.
//!
//! This crate defines the question model, answer grading, derived layouts
//! (matching shuffles, blank templates), statistics, and the session state
//! machine that ties them together.

pub mod error;
pub mod evaluator;
pub mod layout;
pub mod loader;
pub mod model;
pub mod report;
pub mod session;
pub mod statistics;
pub mod time;

pub use error::{EntityKind, QuizError};
pub use evaluator::{evaluate, Correctness, Evaluation, EvaluationDetail, MatchResult};
pub use model::{Answer, Difficulty, Question, QuestionKind, QuestionSet, UserAnswer};
pub use session::{EngineOptions, SessionEngine, SessionPhase, SessionState};
pub use statistics::{compute_stats, SessionStats};
