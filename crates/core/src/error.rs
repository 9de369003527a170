//! Error taxonomy for the interview core.
//!
//! Backend failures are converted into these types at the engine and
//! transcriber boundary; raw `anyhow` errors from the REST clients never
//! reach the session controller.

use crate::models::{Criterion, SessionStatus};
use thiserror::Error;
use uuid::Uuid;

/// Validation failures when constructing domain records.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("invalid score bounds: min {min} must be below max {max}")]
    InvalidBounds { min: f32, max: f32 },
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM backend failed while generating a question: {0}")]
    Backend(String),
    #[error("malformed question from LLM: {0}")]
    Malformed(String),
    #[error("question generation failed after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("LLM backend failed while scoring an answer: {0}")]
    Backend(String),
    #[error("malformed score from LLM: {0}")]
    Malformed(String),
    #[error("{criterion} score {value} is outside {min}..={max}")]
    OutOfRange {
        criterion: Criterion,
        value: f32,
        min: f32,
        max: f32,
    },
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("no speech-to-text backend is configured")]
    Unavailable,
    #[error("audio input is empty")]
    Empty,
    #[error("audio input is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },
    #[error("unsupported audio format: '{0}'")]
    UnsupportedFormat(String),
    #[error("invalid audio data: {0}")]
    InvalidAudio(String),
    #[error("speech-to-text backend failed: {0}")]
    Backend(String),
    #[error("no speech was recognised in the audio")]
    EmptyTranscript,
}

/// A session operation was attempted in a state that does not allow it.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidStateError {
    #[error("cannot {operation} while the session is {status}")]
    WrongStatus {
        operation: &'static str,
        status: SessionStatus,
    },
    #[error("the session already asked its maximum of {max} question(s)")]
    QuestionLimitReached { max: usize },
    #[error("the current question has not been answered or skipped yet")]
    AwaitingAnswer,
    #[error("there is no unanswered question in this session")]
    NoPendingQuestion,
    #[error("question {0} is not part of this session")]
    UnknownQuestion(Uuid),
    #[error("question {0} was already answered or skipped")]
    AlreadyAnswered(Uuid),
    #[error("question {0} has no answer yet")]
    NotAnswered(Uuid),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("missing environment variable: {0}")]
    MissingVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Everything the session controller can hand back to a front end.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl GenerationError {
    /// The innermost cause, looking through `Exhausted`.
    pub fn root(&self) -> &GenerationError {
        match self {
            GenerationError::Exhausted { last, .. } => last.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_reports_last_cause() {
        let err = GenerationError::Exhausted {
            attempts: 2,
            last: Box::new(GenerationError::Malformed("missing field `question`".into())),
        };

        assert_eq!(
            err.to_string(),
            "question generation failed after 2 attempt(s): malformed question from LLM: missing field `question`"
        );
        assert!(matches!(err.root(), GenerationError::Malformed(_)));
    }

    #[test]
    fn session_error_is_transparent() {
        let err: SessionError = InvalidStateError::WrongStatus {
            operation: "submit an answer",
            status: SessionStatus::Completed,
        }
        .into();

        assert_eq!(err.to_string(), "cannot submit an answer while the session is completed");
    }
}
