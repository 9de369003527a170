pub mod backend;
pub mod engine;
pub mod error;
pub mod models;
pub mod prompts;
pub mod session_state;
pub mod settings;
pub mod transcriber;

pub use backend::{CompletionRequest, LlmBackend, SpeechInput, SpeechToText};
pub use engine::InterviewEngine;
pub use error::{
    ConfigurationError, GenerationError, InvalidStateError, ModelError, ScoringError, SessionError,
    TranscriptionError,
};
pub use models::{
    Answer, AnswerSource, Criterion, Difficulty, InterviewerStyle, Question, QuestionType, ScoreBreakdown,
    SessionConfig, SessionState, SessionStatus, SessionSummary,
};
pub use prompts::PromptSet;
pub use session_state::{Evaluation, SessionController};
pub use settings::{Provider, Settings};
pub use transcriber::{AudioFormat, Transcriber, Transcript};
