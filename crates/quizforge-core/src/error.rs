//! Engine error types.
//!
//! Every variant is a contract violation by the caller or by upstream
//! question data. None of them are transient, so nothing here is retryable.
//! Loader implementations wrap these in `anyhow::Error`; callers can
//! downcast to tell a missing set apart from an IO failure.

use std::fmt;

use thiserror::Error;

use crate::session::SessionPhase;

/// What kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    QuestionSet,
    Question,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::QuestionSet => write!(f, "question set"),
            EntityKind::Question => write!(f, "question"),
        }
    }
}

/// Errors raised by the question model and the session engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuizError {
    /// Malformed question data or an answer payload of the wrong shape.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// An unknown question-set id, or a question id outside the active set.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The operation is not legal in the current session phase.
    #[error("cannot {operation} while session is {phase}")]
    State {
        operation: &'static str,
        phase: SessionPhase,
    },
}

impl QuizError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QuizError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn question_not_found(id: impl Into<String>) -> Self {
        QuizError::NotFound {
            kind: EntityKind::Question,
            id: id.into(),
        }
    }

    pub(crate) fn set_not_found(id: impl Into<String>) -> Self {
        QuizError::NotFound {
            kind: EntityKind::QuestionSet,
            id: id.into(),
        }
    }

    /// Always `true`: engine errors signal a defect, never a transient condition.
    pub fn is_contract_violation(&self) -> bool {
        true
    }

    /// The offending field for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            QuizError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = QuizError::validation("blanks", "expected 2 blanks, found 1");
        assert_eq!(err.to_string(), "invalid blanks: expected 2 blanks, found 1");
        assert_eq!(err.field(), Some("blanks"));

        let err = QuizError::set_not_found("geo-101");
        assert_eq!(err.to_string(), "question set not found: geo-101");
        assert!(err.field().is_none());

        let err = QuizError::State {
            operation: "submit an answer",
            phase: SessionPhase::Uninitialized,
        };
        assert_eq!(
            err.to_string(),
            "cannot submit an answer while session is uninitialized"
        );
    }

    #[test]
    fn survives_anyhow_round_trip() {
        let wrapped: anyhow::Error = QuizError::question_not_found("q9").into();
        let inner = wrapped.downcast_ref::<QuizError>().unwrap();
        assert!(matches!(
            inner,
            QuizError::NotFound {
                kind: EntityKind::Question,
                ..
            }
        ));
        assert!(inner.is_contract_violation());
    }
}
