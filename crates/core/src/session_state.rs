//! The session controller: the only place a [`SessionState`] is mutated.
//!
//! Every operation checks its preconditions first, then calls out to the
//! engine or transcriber, and only touches the state once those calls have
//! succeeded. A failed call leaves the session exactly as it was.

use crate::engine::InterviewEngine;
use crate::error::{InvalidStateError, SessionError, TranscriptionError};
use crate::models::{
    Answer, AnswerSource, Question, ScoreBreakdown, SessionConfig, SessionState, SessionStatus,
    SessionSummary, Turn,
};
use crate::transcriber::Transcriber;
use uuid::Uuid;

/// An answer together with the score it received.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub answer: Answer,
    /// `None` when scoring is turned off in the settings.
    pub score: Option<ScoreBreakdown>,
    /// True when this answer used up the last question and closed the session.
    pub session_completed: bool,
}

pub struct SessionController {
    state: SessionState,
    engine: InterviewEngine,
    transcriber: Option<Transcriber>,
}

impl SessionController {
    pub fn new(engine: InterviewEngine, transcriber: Option<Transcriber>) -> Self {
        Self {
            state: SessionState::new(),
            engine,
            transcriber,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn summary(&self) -> SessionSummary {
        self.state.summary()
    }

    /// The question currently waiting for an answer, if any.
    pub fn current_question(&self) -> Option<&Question> {
        self.state.pending_turn().map(Turn::question)
    }

    /// The pending question's own hint followed by general tips for its type.
    pub fn hints(&self) -> Vec<String> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        question
            .hint()
            .map(str::to_string)
            .into_iter()
            .chain(question.question_type().answering_tips().iter().map(|t| t.to_string()))
            .collect()
    }

    pub fn can_transcribe(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Whether the interviewer should respond to answers in conversation.
    pub fn is_conversational(&self) -> bool {
        self.engine.settings().interview.conversational
    }

    /// The interviewer's conversational response to the recorded answer for `question_id`.
    /// Reads the session but never changes it.
    pub async fn interviewer_reply(&self, question_id: Uuid) -> Result<String, SessionError> {
        let config = self.config()?;
        let turn = self
            .state
            .turns()
            .iter()
            .find(|turn| turn.question().id() == question_id)
            .ok_or(InvalidStateError::UnknownQuestion(question_id))?;
        let answer = turn.answer().ok_or(InvalidStateError::NotAnswered(question_id))?;

        let reply = self.engine.interviewer_reply(turn.question(), answer, config).await?;
        Ok(reply)
    }

    pub fn start(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        self.require(SessionStatus::NotStarted, "start")?;
        config.validate()?;

        tracing::info!(
            "starting session {} for '{}' ({} questions, {} style, {} difficulty)",
            self.state.id(),
            config.position,
            config.max_questions,
            config.style,
            config.difficulty
        );
        self.state.begin(config);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), InvalidStateError> {
        self.require(SessionStatus::InProgress, "pause")?;
        self.state.set_status(SessionStatus::Paused);
        tracing::info!("session {} paused", self.state.id());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), InvalidStateError> {
        self.require(SessionStatus::Paused, "resume")?;
        self.state.set_status(SessionStatus::InProgress);
        tracing::info!("session {} resumed", self.state.id());
        Ok(())
    }

    /// Asks the engine for the next question and records it.
    pub async fn next_question(&mut self) -> Result<Question, SessionError> {
        self.require(SessionStatus::InProgress, "ask for the next question")?;
        if self.state.pending_turn().is_some() {
            return Err(InvalidStateError::AwaitingAnswer.into());
        }
        let config = self.config()?.clone();
        if self.state.questions_asked() >= config.max_questions {
            self.finish();
            return Err(InvalidStateError::QuestionLimitReached {
                max: config.max_questions,
            }
            .into());
        }

        let question = self.engine.generate_question(&self.state, &config).await?;
        tracing::debug!(
            "question {}/{}: {}",
            self.state.questions_asked() + 1,
            config.max_questions,
            question.text()
        );
        self.state.push_turn(Turn::new(question.clone()));
        Ok(question)
    }

    /// Answers the pending question with typed text.
    pub async fn submit_answer(&mut self, text: &str) -> Result<Evaluation, SessionError> {
        self.require(SessionStatus::InProgress, "submit an answer")?;
        let question_id = self.pending_question_id()?;
        self.submit_answer_to(question_id, text, AnswerSource::Typed).await
    }

    pub async fn submit_answer_to(
        &mut self,
        question_id: Uuid,
        text: &str,
        source: AnswerSource,
    ) -> Result<Evaluation, SessionError> {
        self.evaluate(question_id, text, source, None).await
    }

    /// Transcribes recorded audio and submits the transcript for the pending question.
    pub async fn submit_audio(&mut self, audio: Vec<u8>, format: &str) -> Result<Evaluation, SessionError> {
        self.require(SessionStatus::InProgress, "submit an answer")?;
        let question_id = self.pending_question_id()?;
        let transcriber = self.transcriber.as_ref().ok_or(TranscriptionError::Unavailable)?;

        let transcript = transcriber.transcribe(audio, format).await?;
        self.evaluate(
            question_id,
            &transcript.text,
            AnswerSource::Transcribed,
            transcript.duration_seconds,
        )
        .await
    }

    /// Marks the pending question as skipped. Returns whether the session completed.
    pub fn skip_question(&mut self) -> Result<bool, SessionError> {
        self.require(SessionStatus::InProgress, "skip a question")?;
        let question_id = self.pending_question_id()?;

        if let Some(turn) = self.state.turn_mut(question_id) {
            turn.skip();
        }
        tracing::info!("question {} skipped", question_id);
        Ok(self.complete_if_limit_reached())
    }

    /// Ends the session early. Allowed from in-progress or paused.
    pub fn complete(&mut self) -> Result<SessionSummary, InvalidStateError> {
        match self.state.status() {
            SessionStatus::InProgress | SessionStatus::Paused => {
                self.finish();
                Ok(self.state.summary())
            }
            status => Err(InvalidStateError::WrongStatus {
                operation: "complete the session",
                status,
            }),
        }
    }

    async fn evaluate(
        &mut self,
        question_id: Uuid,
        text: &str,
        source: AnswerSource,
        duration_seconds: Option<f32>,
    ) -> Result<Evaluation, SessionError> {
        self.require(SessionStatus::InProgress, "submit an answer")?;
        let config = self.config()?.clone();
        let turn = self
            .state
            .turns()
            .iter()
            .find(|turn| turn.question().id() == question_id)
            .ok_or(InvalidStateError::UnknownQuestion(question_id))?;
        if !turn.is_pending() {
            return Err(InvalidStateError::AlreadyAnswered(question_id).into());
        }
        let question = turn.question().clone();

        let answer = Answer::new(question_id, text, source)?.with_duration(duration_seconds);
        let score = if self.engine.settings().interview.enable_scoring {
            Some(self.engine.score_answer(&question, &answer, &config).await?)
        } else {
            tracing::debug!("scoring disabled, recording answer to {} unscored", question_id);
            None
        };

        if let Some(turn) = self.state.turn_mut(question_id) {
            turn.record(answer.clone(), score.clone());
        }
        let session_completed = self.complete_if_limit_reached();

        Ok(Evaluation {
            answer,
            score,
            session_completed,
        })
    }

    fn complete_if_limit_reached(&mut self) -> bool {
        let limit_reached = self
            .state
            .config()
            .is_some_and(|config| self.state.questions_asked() >= config.max_questions);
        if limit_reached && self.state.pending_turn().is_none() {
            self.finish();
            return true;
        }
        false
    }

    fn finish(&mut self) {
        self.state.finish();
        tracing::info!(
            "session {} completed after {} question(s)",
            self.state.id(),
            self.state.questions_asked()
        );
    }

    fn require(&self, expected: SessionStatus, operation: &'static str) -> Result<(), InvalidStateError> {
        let status = self.state.status();
        if status == expected {
            Ok(())
        } else {
            Err(InvalidStateError::WrongStatus { operation, status })
        }
    }

    fn config(&self) -> Result<&SessionConfig, InvalidStateError> {
        self.state.config().ok_or(InvalidStateError::WrongStatus {
            operation: "read the session configuration",
            status: self.state.status(),
        })
    }

    fn pending_question_id(&self) -> Result<Uuid, InvalidStateError> {
        self.state
            .pending_turn()
            .map(|turn| turn.question().id())
            .ok_or(InvalidStateError::NoPendingQuestion)
    }
}
