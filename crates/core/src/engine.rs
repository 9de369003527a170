use crate::backend::{CompletionRequest, LlmBackend};
use crate::error::{GenerationError, ScoringError};
use crate::models::{
    Answer, Criterion, CriterionScores, Difficulty, Question, QuestionType, ScoreBreakdown, SessionConfig,
    SessionState,
};
use crate::prompts::{PromptKind, PromptSet};
use crate::settings::Settings;
use serde::Deserialize;
use std::sync::Arc;

/// Scoring runs cooler than generation so repeated evaluations stay consistent.
pub const SCORING_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionPayload {
    question: String,
    #[serde(rename = "type")]
    question_type: String,
    difficulty: String,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    follow_ups: Vec<String>,
    #[serde(default)]
    key_points: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScorePayload {
    scores: CriterionScores,
    feedback: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Turns session context into prompts and model replies into typed records.
pub struct InterviewEngine {
    llm: Arc<dyn LlmBackend>,
    settings: Arc<Settings>,
    prompts: PromptSet,
}

impl InterviewEngine {
    pub fn new(llm: Arc<dyn LlmBackend>, settings: Arc<Settings>, prompts: PromptSet) -> Self {
        Self { llm, settings, prompts }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generates the next question for `state`, retrying malformed or failed replies.
    pub async fn generate_question(
        &self,
        state: &SessionState,
        config: &SessionConfig,
    ) -> Result<Question, GenerationError> {
        let question_type = config.question_type_for(state.questions_asked());
        let previous = state.asked_questions();
        let prompt = self.question_prompt(config, question_type, &previous);
        let attempts = self.settings.interview.generation_attempts.max(1);

        let mut last = None;
        for attempt in 1..=attempts {
            match self.try_generate(&prompt, question_type, config, &previous).await {
                Ok(question) => {
                    tracing::info!(
                        "generated {} question for '{}' on attempt {}",
                        question_type,
                        config.position,
                        attempt
                    );
                    return Ok(question);
                }
                Err(e) => {
                    tracing::warn!("question generation attempt {}/{} failed: {}", attempt, attempts, e);
                    last = Some(e);
                }
            }
        }

        Err(GenerationError::Exhausted {
            attempts,
            last: Box::new(last.unwrap_or_else(|| GenerationError::Backend("no attempt was made".to_string()))),
        })
    }

    async fn try_generate(
        &self,
        prompt: &str,
        question_type: QuestionType,
        config: &SessionConfig,
        previous: &[&str],
    ) -> Result<Question, GenerationError> {
        let reply = self
            .llm
            .complete(CompletionRequest {
                prompt: prompt.to_string(),
                temperature: self.settings.model.temperature,
                max_tokens: self.settings.model.max_tokens,
                json_output: true,
            })
            .await
            .map_err(|e| GenerationError::Backend(format!("{e:#}")))?;

        let json = extract_json(&reply)
            .ok_or_else(|| GenerationError::Malformed("reply contains no JSON object".to_string()))?;
        let payload: QuestionPayload =
            serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let returned_type = payload
            .question_type
            .parse::<QuestionType>()
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        if returned_type != question_type {
            return Err(GenerationError::Malformed(format!(
                "asked for a {question_type} question, got {returned_type}"
            )));
        }
        let returned_difficulty = payload
            .difficulty
            .parse::<Difficulty>()
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        if returned_difficulty != config.difficulty {
            return Err(GenerationError::Malformed(format!(
                "asked for {} difficulty, got {returned_difficulty}",
                config.difficulty
            )));
        }

        let normalized = normalize(&payload.question);
        if previous.iter().any(|asked| normalize(asked) == normalized) {
            return Err(GenerationError::Malformed(
                "question repeats one already asked".to_string(),
            ));
        }

        Question::new(
            &payload.question,
            question_type,
            config.difficulty,
            &config.position,
            payload.hint,
        )
        .map(|question| question.with_guidance(payload.follow_ups, payload.key_points))
        .map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    /// Scores `answer` against `question`. One attempt, no fallback score.
    pub async fn score_answer(
        &self,
        question: &Question,
        answer: &Answer,
        config: &SessionConfig,
    ) -> Result<ScoreBreakdown, ScoringError> {
        let prompt = self.scoring_prompt(question, answer, config);
        let reply = self
            .llm
            .complete(CompletionRequest {
                prompt,
                temperature: SCORING_TEMPERATURE,
                max_tokens: self.settings.model.max_tokens,
                json_output: true,
            })
            .await
            .map_err(|e| {
                tracing::warn!("scoring request failed: {:#}", e);
                ScoringError::Backend(format!("{e:#}"))
            })?;

        let json = extract_json(&reply)
            .ok_or_else(|| ScoringError::Malformed("reply contains no JSON object".to_string()))?;
        let payload: ScorePayload = serde_json::from_str(json).map_err(|e| {
            tracing::warn!("unparsable score reply: {}", e);
            ScoringError::Malformed(e.to_string())
        })?;

        let breakdown = ScoreBreakdown::new(
            payload.scores,
            &payload.feedback,
            payload.suggestions,
            self.settings.interview.score_bounds,
        )?;
        tracing::info!(
            "scored answer to question {}: overall {:.1}",
            question.id(),
            breakdown.overall()
        );
        Ok(breakdown)
    }

    /// The interviewer's conversational response to `answer`. Plain text, one attempt.
    pub async fn interviewer_reply(
        &self,
        question: &Question,
        answer: &Answer,
        config: &SessionConfig,
    ) -> Result<String, GenerationError> {
        let prompt = self.prompts.render(
            PromptKind::Reply,
            &[
                ("position", config.position.as_str()),
                ("tone", config.style.tone()),
                ("question", question.text()),
                ("answer", answer.text()),
            ],
        );
        let reply = self
            .llm
            .complete(CompletionRequest {
                prompt,
                temperature: self.settings.model.temperature,
                max_tokens: self.settings.model.max_tokens,
                json_output: false,
            })
            .await
            .map_err(|e| GenerationError::Backend(format!("{e:#}")))?;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GenerationError::Malformed("interviewer reply is empty".to_string()));
        }
        Ok(reply.to_string())
    }

    fn question_prompt(&self, config: &SessionConfig, question_type: QuestionType, previous: &[&str]) -> String {
        let previous_questions = if previous.is_empty() {
            "(none yet)".to_string()
        } else {
            previous
                .iter()
                .map(|q| format!("- {q}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        self.prompts.render(
            PromptKind::Question,
            &[
                ("position", config.position.as_str()),
                ("tone", config.style.tone()),
                ("question_type", question_type.as_str()),
                ("difficulty", config.difficulty.as_str()),
                ("previous_questions", previous_questions.as_str()),
            ],
        )
    }

    fn scoring_prompt(&self, question: &Question, answer: &Answer, config: &SessionConfig) -> String {
        let bounds = self.settings.interview.score_bounds;
        let criteria = Criterion::ALL
            .iter()
            .map(Criterion::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let min_score = bounds.min().to_string();
        let max_score = bounds.max().to_string();

        self.prompts.render(
            PromptKind::Scoring,
            &[
                ("position", config.position.as_str()),
                ("question_type", question.question_type().as_str()),
                ("difficulty", question.difficulty().as_str()),
                ("question", question.text()),
                ("answer", answer.text()),
                ("criteria", criteria.as_str()),
                ("min_score", min_score.as_str()),
                ("max_score", max_score.as_str()),
            ],
        )
    }
}

/// Finds the first complete JSON object in a model reply, skipping code fences and
/// surrounding prose. Braces in prose before or after the object are ignored.
pub fn extract_json(reply: &str) -> Option<&str> {
    reply.match_indices('{').find_map(|(start, _)| {
        let rest = &reply[start..];
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(serde_json::Value::Object(_))) => Some(&rest[..stream.byte_offset()]),
            _ => None,
        }
    })
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['?', '.', '!'])
        .to_lowercase()
}
