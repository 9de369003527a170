use crate::error::{ModelError, ScoringError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    Behavioral,
    Technical,
    Situational,
    ProblemSolving,
    Leadership,
    CultureFit,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::Behavioral,
        QuestionType::Technical,
        QuestionType::Situational,
        QuestionType::ProblemSolving,
        QuestionType::Leadership,
        QuestionType::CultureFit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Behavioral => "behavioral",
            QuestionType::Technical => "technical",
            QuestionType::Situational => "situational",
            QuestionType::ProblemSolving => "problem-solving",
            QuestionType::Leadership => "leadership",
            QuestionType::CultureFit => "culture-fit",
        }
    }

    /// General advice for answering this kind of question.
    pub fn answering_tips(&self) -> &'static [&'static str] {
        match self {
            QuestionType::Behavioral | QuestionType::Leadership => &[
                "Use the STAR method (Situation, Task, Action, Result)",
                "Provide specific examples from your experience",
                "Focus on your role and contributions",
            ],
            QuestionType::Technical => &[
                "Explain your thought process step by step",
                "Consider edge cases and trade-offs",
                "Be honest about what you don't know",
            ],
            QuestionType::Situational | QuestionType::ProblemSolving => &[
                "Understand the problem before jumping to solutions",
                "Consider multiple approaches",
                "Explain your reasoning clearly",
            ],
            QuestionType::CultureFit => &[
                "Be genuine about what motivates you",
                "Connect your values to concrete examples",
            ],
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownVariant {
                kind: "question type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ModelError::UnknownVariant {
                kind: "difficulty",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewerStyle {
    #[default]
    ProfessionalFriendly,
    Challenging,
    Supportive,
    Formal,
    Casual,
}

impl InterviewerStyle {
    pub const ALL: [InterviewerStyle; 5] = [
        InterviewerStyle::ProfessionalFriendly,
        InterviewerStyle::Challenging,
        InterviewerStyle::Supportive,
        InterviewerStyle::Formal,
        InterviewerStyle::Casual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewerStyle::ProfessionalFriendly => "professional_friendly",
            InterviewerStyle::Challenging => "challenging",
            InterviewerStyle::Supportive => "supportive",
            InterviewerStyle::Formal => "formal",
            InterviewerStyle::Casual => "casual",
        }
    }

    /// Tone description injected into prompts.
    pub fn tone(&self) -> &'static str {
        match self {
            InterviewerStyle::ProfessionalFriendly => "professional yet warm and encouraging",
            InterviewerStyle::Challenging => "challenging and thought-provoking",
            InterviewerStyle::Supportive => "supportive and helpful",
            InterviewerStyle::Formal => "formal and business-like",
            InterviewerStyle::Casual => "casual and conversational",
        }
    }
}

impl fmt::Display for InterviewerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewerStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        InterviewerStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownVariant {
                kind: "interviewer style",
                value: s.to_string(),
            })
    }
}

/// An interview question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    id: Uuid,
    text: String,
    question_type: QuestionType,
    difficulty: Difficulty,
    position: String,
    hint: Option<String>,
    /// Probing questions an interviewer could ask after the answer.
    follow_ups: Vec<String>,
    /// What a strong answer would cover.
    key_points: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Question {
    pub fn new(
        text: &str,
        question_type: QuestionType,
        difficulty: Difficulty,
        position: &str,
        hint: Option<String>,
    ) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::Empty("question text"));
        }
        let position = position.trim();
        if position.is_empty() {
            return Err(ModelError::Empty("position"));
        }
        let hint = hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        Ok(Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            question_type,
            difficulty,
            position: position.to_string(),
            hint,
            follow_ups: Vec::new(),
            key_points: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Attaches follow-up questions and expected key points. Blank entries are dropped.
    pub fn with_guidance(mut self, follow_ups: Vec<String>, key_points: Vec<String>) -> Self {
        self.follow_ups = non_blank(follow_ups);
        self.key_points = non_blank(key_points);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }

    pub fn key_points(&self) -> &[String] {
        &self.key_points
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Typed,
    Transcribed,
}

/// A candidate's answer to one question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    id: Uuid,
    question_id: Uuid,
    text: String,
    source: AnswerSource,
    timestamp: DateTime<Utc>,
    duration_seconds: Option<f32>,
}

impl Answer {
    pub fn new(question_id: Uuid, text: &str, source: AnswerSource) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::Empty("answer text"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            question_id,
            text: text.to_string(),
            source,
            timestamp: Utc::now(),
            duration_seconds: None,
        })
    }

    pub fn with_duration(mut self, seconds: Option<f32>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> AnswerSource {
        self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn duration_seconds(&self) -> Option<f32> {
        self.duration_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Clarity,
    Specificity,
    Relevance,
    Structure,
    Confidence,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Clarity,
        Criterion::Specificity,
        Criterion::Relevance,
        Criterion::Structure,
        Criterion::Confidence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Clarity => "clarity",
            Criterion::Specificity => "specificity",
            Criterion::Relevance => "relevance",
            Criterion::Structure => "structure",
            Criterion::Confidence => "confidence",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range every criterion score must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreBounds")]
pub struct ScoreBounds {
    min: f32,
    max: f32,
}

#[derive(Deserialize)]
struct RawScoreBounds {
    min: f32,
    max: f32,
}

impl TryFrom<RawScoreBounds> for ScoreBounds {
    type Error = ModelError;

    fn try_from(raw: RawScoreBounds) -> Result<Self, Self::Error> {
        ScoreBounds::new(raw.min, raw.max)
    }
}

impl ScoreBounds {
    pub fn new(min: f32, max: f32) -> Result<Self, ModelError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ModelError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriterionScores {
    pub clarity: f32,
    pub specificity: f32,
    pub relevance: f32,
    pub structure: f32,
    pub confidence: f32,
}

impl CriterionScores {
    pub fn get(&self, criterion: Criterion) -> f32 {
        match criterion {
            Criterion::Clarity => self.clarity,
            Criterion::Specificity => self.specificity,
            Criterion::Relevance => self.relevance,
            Criterion::Structure => self.structure,
            Criterion::Confidence => self.confidence,
        }
    }
}

/// Per-criterion evaluation of one answer. Immutable once created.
///
/// Deserializing goes through [`ScoreBreakdown::new`], so stored breakdowns
/// are held to the same checks as fresh ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreBreakdown")]
pub struct ScoreBreakdown {
    scores: CriterionScores,
    feedback: String,
    suggestions: Vec<String>,
    bounds: ScoreBounds,
}

#[derive(Deserialize)]
struct RawScoreBreakdown {
    scores: CriterionScores,
    feedback: String,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    bounds: ScoreBounds,
}

impl TryFrom<RawScoreBreakdown> for ScoreBreakdown {
    type Error = ScoringError;

    fn try_from(raw: RawScoreBreakdown) -> Result<Self, Self::Error> {
        ScoreBreakdown::new(raw.scores, &raw.feedback, raw.suggestions, raw.bounds)
    }
}

impl ScoreBreakdown {
    /// Rejects any criterion outside `bounds`; values are never clamped.
    pub fn new(
        scores: CriterionScores,
        feedback: &str,
        suggestions: Vec<String>,
        bounds: ScoreBounds,
    ) -> Result<Self, ScoringError> {
        for criterion in Criterion::ALL {
            let value = scores.get(criterion);
            if !bounds.contains(value) {
                return Err(ScoringError::OutOfRange {
                    criterion,
                    value,
                    min: bounds.min(),
                    max: bounds.max(),
                });
            }
        }
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(ScoringError::Malformed("feedback is empty".to_string()));
        }
        let suggestions = non_blank(suggestions);

        Ok(Self {
            scores,
            feedback: feedback.to_string(),
            suggestions,
            bounds,
        })
    }

    pub fn score(&self, criterion: Criterion) -> f32 {
        self.scores.get(criterion)
    }

    pub fn scores(&self) -> &CriterionScores {
        &self.scores
    }

    /// Mean of the five criteria.
    pub fn overall(&self) -> f32 {
        let total: f32 = Criterion::ALL.iter().map(|c| self.scores.get(*c)).sum();
        total / Criterion::ALL.len() as f32
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn bounds(&self) -> ScoreBounds {
        self.bounds
    }
}

/// One question and whatever happened to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    question: Question,
    answer: Option<Answer>,
    score: Option<ScoreBreakdown>,
    skipped: bool,
}

impl Turn {
    pub(crate) fn new(question: Question) -> Self {
        Self {
            question,
            answer: None,
            score: None,
            skipped: false,
        }
    }

    /// `score` is `None` when scoring is turned off.
    pub(crate) fn record(&mut self, answer: Answer, score: Option<ScoreBreakdown>) {
        self.answer = Some(answer);
        self.score = score;
    }

    pub(crate) fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    pub fn score(&self) -> Option<&ScoreBreakdown> {
        self.score.as_ref()
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Still waiting for an answer.
    pub fn is_pending(&self) -> bool {
        self.answer.is_none() && !self.skipped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::InProgress => "in progress",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Snapshot of the choices a session was started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub position: String,
    pub style: InterviewerStyle,
    pub difficulty: Difficulty,
    pub question_types: Vec<QuestionType>,
    pub max_questions: usize,
}

impl SessionConfig {
    pub fn new(position: &str, max_questions: usize) -> Self {
        Self {
            position: position.to_string(),
            style: InterviewerStyle::default(),
            difficulty: Difficulty::Medium,
            question_types: vec![
                QuestionType::Behavioral,
                QuestionType::Technical,
                QuestionType::Situational,
                QuestionType::ProblemSolving,
            ],
            max_questions,
        }
    }

    pub fn with_style(mut self, style: InterviewerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_question_types(mut self, question_types: Vec<QuestionType>) -> Self {
        self.question_types = question_types;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.position.trim().is_empty() {
            return Err(ModelError::Empty("position"));
        }
        if self.max_questions == 0 {
            return Err(ModelError::InvalidConfig(
                "max_questions must be at least 1".to_string(),
            ));
        }
        if self.question_types.is_empty() {
            return Err(ModelError::InvalidConfig(
                "at least one question type is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Question types rotate in the configured order.
    pub fn question_type_for(&self, index: usize) -> QuestionType {
        self.question_types
            .get(index % self.question_types.len().max(1))
            .copied()
            .unwrap_or(QuestionType::Behavioral)
    }
}

/// All state of one practice interview. Only the session controller mutates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    id: Uuid,
    status: SessionStatus,
    config: Option<SessionConfig>,
    turns: Vec<Turn>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::NotStarted,
            config: None,
            turns: Vec::new(),
            started_at: None,
            ended_at: None,
        }
    }

    pub(crate) fn begin(&mut self, config: SessionConfig) {
        self.config = Some(config);
        self.turns.clear();
        self.started_at = Some(Utc::now());
        self.ended_at = None;
        self.status = SessionStatus::InProgress;
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub(crate) fn finish(&mut self) {
        self.status = SessionStatus::Completed;
        self.ended_at = Some(Utc::now());
    }

    pub(crate) fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn turn_mut(&mut self, question_id: Uuid) -> Option<&mut Turn> {
        self.turns
            .iter_mut()
            .find(|turn| turn.question.id() == question_id)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn questions_asked(&self) -> usize {
        self.turns.len()
    }

    pub fn answers_given(&self) -> usize {
        self.turns.iter().filter(|t| t.answer.is_some()).count()
    }

    pub fn questions_skipped(&self) -> usize {
        self.turns.iter().filter(|t| t.skipped).count()
    }

    /// The most recent question still waiting for an answer.
    pub fn pending_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_pending())
    }

    pub fn asked_questions(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.question.text()).collect()
    }

    /// Mean overall score across scored turns.
    pub fn average_score(&self) -> Option<f32> {
        let scores: Vec<f32> = self
            .turns
            .iter()
            .filter_map(|t| t.score.as_ref().map(ScoreBreakdown::overall))
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    }

    pub fn summary(&self) -> SessionSummary {
        let scored: Vec<&ScoreBreakdown> = self.turns.iter().filter_map(|t| t.score.as_ref()).collect();
        let criterion_averages = if scored.is_empty() {
            Vec::new()
        } else {
            Criterion::ALL
                .iter()
                .map(|c| {
                    let total: f32 = scored.iter().map(|s| s.score(*c)).sum();
                    (*c, total / scored.len() as f32)
                })
                .collect()
        };
        let duration_minutes = match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f32 / 60_000.0),
            _ => None,
        };

        SessionSummary {
            status: self.status,
            questions_asked: self.questions_asked(),
            answers_given: self.answers_given(),
            questions_skipped: self.questions_skipped(),
            average_score: self.average_score(),
            criterion_averages,
            duration_minutes,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub status: SessionStatus,
    pub questions_asked: usize,
    pub answers_given: usize,
    pub questions_skipped: usize,
    pub average_score: Option<f32>,
    pub criterion_averages: Vec<(Criterion, f32)>,
    pub duration_minutes: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(value: f32) -> CriterionScores {
        CriterionScores {
            clarity: value,
            specificity: value,
            relevance: value,
            structure: value,
            confidence: value,
        }
    }

    #[test]
    fn question_requires_text_and_position() {
        let err = Question::new("  ", QuestionType::Technical, Difficulty::Hard, "SRE", None).unwrap_err();
        assert_eq!(err, ModelError::Empty("question text"));

        let err = Question::new("Why?", QuestionType::Technical, Difficulty::Hard, "", None).unwrap_err();
        assert_eq!(err, ModelError::Empty("position"));
    }

    #[test]
    fn question_trims_and_drops_blank_hint() {
        let q = Question::new(
            "  Describe a hard bug.  ",
            QuestionType::Technical,
            Difficulty::Medium,
            "Software Engineer",
            Some("   ".to_string()),
        )
        .unwrap();

        assert_eq!(q.text(), "Describe a hard bug.");
        assert!(q.hint().is_none());
    }

    #[test]
    fn enums_parse_loosely_and_display_canonically() {
        assert_eq!("Problem Solving".parse::<QuestionType>().unwrap(), QuestionType::ProblemSolving);
        assert_eq!("culture_fit".parse::<QuestionType>().unwrap(), QuestionType::CultureFit);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(
            "professional-friendly".parse::<InterviewerStyle>().unwrap(),
            InterviewerStyle::ProfessionalFriendly
        );
        assert_eq!(QuestionType::ProblemSolving.to_string(), "problem-solving");
        assert!("trivia".parse::<QuestionType>().is_err());
    }

    #[test]
    fn question_type_serializes_kebab_case() {
        let json = serde_json::to_string(&QuestionType::ProblemSolving).unwrap();
        assert_eq!(json, "\"problem-solving\"");
    }

    #[test]
    fn answer_rejects_blank_text() {
        let err = Answer::new(Uuid::new_v4(), "\n\t", AnswerSource::Typed).unwrap_err();
        assert_eq!(err, ModelError::Empty("answer text"));
    }

    #[test]
    fn score_bounds_must_be_ordered() {
        assert!(ScoreBounds::new(10.0, 0.0).is_err());
        assert!(ScoreBounds::new(1.0, 1.0).is_err());
        assert!(ScoreBounds::new(f32::NAN, 5.0).is_err());
        assert!(ScoreBounds::new(1.0, 5.0).is_ok());
    }

    #[test]
    fn score_breakdown_rejects_out_of_range_values() {
        let mut s = scores(7.0);
        s.structure = 11.5;
        let err = ScoreBreakdown::new(s, "Good.", vec![], ScoreBounds::default()).unwrap_err();

        match err {
            ScoringError::OutOfRange { criterion, value, .. } => {
                assert_eq!(criterion, Criterion::Structure);
                assert_eq!(value, 11.5);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn score_breakdown_rejects_nan() {
        let mut s = scores(5.0);
        s.clarity = f32::NAN;
        assert!(ScoreBreakdown::new(s, "ok", vec![], ScoreBounds::default()).is_err());
    }

    #[test]
    fn score_breakdown_accepts_bounds_inclusive() {
        let mut s = scores(0.0);
        s.confidence = 10.0;
        let breakdown = ScoreBreakdown::new(
            s,
            " Solid structure. ",
            vec!["Quantify impact".into(), "  ".into()],
            ScoreBounds::default(),
        )
        .unwrap();

        assert_eq!(breakdown.overall(), 2.0);
        assert_eq!(breakdown.feedback(), "Solid structure.");
        assert_eq!(breakdown.suggestions(), ["Quantify impact".to_string()]);
    }

    #[test]
    fn stored_breakdowns_are_validated_on_load() {
        // Arrange
        let out_of_range = r#"{"scores": {"clarity": 99, "specificity": -5, "relevance": 5, "structure": 5, "confidence": 5}, "feedback": "", "bounds": {"min": 0, "max": 10}}"#;
        let inverted = r#"{"scores": {"clarity": 5, "specificity": 5, "relevance": 5, "structure": 5, "confidence": 5}, "feedback": "Fine.", "bounds": {"min": 50, "max": 1}}"#;

        // Act
        let out_of_range = serde_json::from_str::<ScoreBreakdown>(out_of_range);
        let inverted = serde_json::from_str::<ScoreBreakdown>(inverted);

        // Assert
        assert!(out_of_range.unwrap_err().to_string().contains("clarity"));
        assert!(inverted.is_err());
    }

    #[test]
    fn breakdown_survives_a_json_round_trip() {
        let breakdown = ScoreBreakdown::new(scores(4.0), "Fine.", vec!["More detail".into()], ScoreBounds::default())
            .unwrap();

        let json = serde_json::to_string(&breakdown).unwrap();
        let loaded: ScoreBreakdown = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, breakdown);
    }

    #[test]
    fn guidance_drops_blank_entries() {
        let q = Question::new("Why Rust?", QuestionType::Technical, Difficulty::Easy, "SRE", None)
            .unwrap()
            .with_guidance(
                vec!["What would you change?".into(), " ".into()],
                vec!["Memory safety".into(), "".into(), " Tooling ".into()],
            );

        assert_eq!(q.follow_ups(), ["What would you change?".to_string()]);
        assert_eq!(q.key_points(), ["Memory safety".to_string(), "Tooling".to_string()]);
    }

    #[test]
    fn config_validation() {
        assert!(SessionConfig::new("Data Scientist", 3).validate().is_ok());
        assert!(SessionConfig::new(" ", 3).validate().is_err());
        assert!(SessionConfig::new("Data Scientist", 0).validate().is_err());
        assert!(
            SessionConfig::new("Data Scientist", 3)
                .with_question_types(vec![])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn question_types_rotate() {
        let config = SessionConfig::new("PM", 5)
            .with_question_types(vec![QuestionType::Behavioral, QuestionType::Technical]);

        assert_eq!(config.question_type_for(0), QuestionType::Behavioral);
        assert_eq!(config.question_type_for(1), QuestionType::Technical);
        assert_eq!(config.question_type_for(2), QuestionType::Behavioral);
    }

    #[test]
    fn summary_averages_scored_turns_only() {
        let mut state = SessionState::new();
        state.begin(SessionConfig::new("SRE", 3));

        let q1 = Question::new("Q1", QuestionType::Behavioral, Difficulty::Easy, "SRE", None).unwrap();
        let q2 = Question::new("Q2", QuestionType::Technical, Difficulty::Easy, "SRE", None).unwrap();
        let q1_id = q1.id();
        let q2_id = q2.id();
        state.push_turn(Turn::new(q1));
        state.push_turn(Turn::new(q2));

        let answer = Answer::new(q1_id, "An answer", AnswerSource::Typed).unwrap();
        let score = ScoreBreakdown::new(scores(6.0), "Fine.", vec![], ScoreBounds::default()).unwrap();
        state.turn_mut(q1_id).unwrap().record(answer, Some(score));
        state.turn_mut(q2_id).unwrap().skip();
        state.finish();

        let summary = state.summary();
        assert_eq!(summary.questions_asked, 2);
        assert_eq!(summary.answers_given, 1);
        assert_eq!(summary.questions_skipped, 1);
        assert_eq!(summary.average_score, Some(6.0));
        assert_eq!(summary.criterion_averages.len(), 5);
        assert!(summary.duration_minutes.is_some());
        assert!(state.pending_turn().is_none());
    }
}
