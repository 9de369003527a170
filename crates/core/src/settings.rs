//! Runtime settings.
//!
//! Everything is read from `INTERVIEWER_*` environment variables (a `.env`
//! file is honoured) and validated once at startup. The resulting
//! [`Settings`] is shared read-only for the life of the process.

use crate::error::ConfigurationError;
use crate::models::ScoreBounds;
use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const ENV_PREFIX: &str = "INTERVIEWER_";

pub const DEFAULT_GEMINI_CHAT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MAX_QUESTIONS: usize = 10;
pub const DEFAULT_GENERATION_ATTEMPTS: u32 = 2;
pub const MAX_GENERATION_ATTEMPTS: u32 = 3;
/// Matches the Whisper upload limit.
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAI,
}

impl Provider {
    pub fn default_chat_model(&self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_CHAT_MODEL,
            Provider::OpenAI => DEFAULT_OPENAI_CHAT_MODEL,
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            other => Err(format!("expected 'gemini' or 'openai', got '{other}'")),
        }
    }
}

#[derive(Debug, Default)]
pub struct ApiSettings {
    /// Which service generates questions and scores answers.
    pub provider: Provider,
    pub gemini_api_key: Option<SecretString>,
    /// Also enables Whisper transcription when Gemini is the provider.
    pub openai_api_key: Option<SecretString>,
    /// Applied to every HTTP request.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Model name passed to the provider, e.g. `gemini-2.0-flash`.
    pub chat_model: String,
    /// Sampling temperature for question generation, 0.0 to 2.0.
    pub temperature: f32,
    /// Output token cap for every completion.
    pub max_tokens: u32,
    /// Whisper model used when an OpenAI key is present.
    pub transcription_model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterviewSettings {
    /// Questions per session unless the session overrides it.
    pub max_questions: usize,
    /// Tries per question before generation gives up, 1..=3.
    pub generation_attempts: u32,
    pub score_bounds: ScoreBounds,
    /// When off, answers are recorded without asking the LLM for a score.
    pub enable_scoring: bool,
    /// When on, the interviewer responds to each answer in conversation.
    pub conversational: bool,
    /// Directory with `.md` files that replace the built-in prompts.
    pub prompts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionSettings {
    /// Larger uploads are rejected before any request is made.
    pub max_audio_bytes: usize,
}

#[derive(Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub model: ModelSettings,
    pub interview: InterviewSettings,
    pub transcription: TranscriptionSettings,
    pub debug: bool,
    pub log_level: Level,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
                ..Default::default()
            },
            model: ModelSettings {
                chat_model: DEFAULT_GEMINI_CHAT_MODEL.to_string(),
                temperature: DEFAULT_TEMPERATURE,
                max_tokens: DEFAULT_MAX_TOKENS,
                transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            },
            interview: InterviewSettings {
                max_questions: DEFAULT_MAX_QUESTIONS,
                generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
                score_bounds: ScoreBounds::default(),
                enable_scoring: true,
                conversational: false,
                prompts_dir: None,
            },
            transcription: TranscriptionSettings {
                max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
            },
            debug: false,
            log_level: Level::INFO,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// * `INTERVIEWER_PROVIDER`: `gemini` (default) or `openai`.
    /// * `INTERVIEWER_GEMINI_API_KEY` / `INTERVIEWER_OPENAI_API_KEY`: required for the chosen provider.
    /// * `INTERVIEWER_CHAT_MODEL`, `INTERVIEWER_TEMPERATURE`, `INTERVIEWER_MAX_TOKENS`.
    /// * `INTERVIEWER_TRANSCRIPTION_MODEL`, `INTERVIEWER_MAX_AUDIO_BYTES`.
    /// * `INTERVIEWER_MAX_QUESTIONS`, `INTERVIEWER_GENERATION_ATTEMPTS`, `INTERVIEWER_PROMPTS_DIR`.
    /// * `INTERVIEWER_ENABLE_SCORING` (default on), `INTERVIEWER_CONVERSATIONAL` (default off).
    /// * `INTERVIEWER_REQUEST_TIMEOUT_SECS`, `INTERVIEWER_DEBUG`, `INTERVIEWER_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        // Local development convenience, ignored when absent.
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source. Names are looked up
    /// with the `INTERVIEWER_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let defaults = Settings::default();

        let provider = vars.parse("PROVIDER", Provider::from_str)?.unwrap_or_default();
        let gemini_api_key = vars.get("GEMINI_API_KEY").map(SecretString::from);
        let openai_api_key = vars.get("OPENAI_API_KEY").map(SecretString::from);

        match provider {
            Provider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigurationError::MissingVar(format!("{ENV_PREFIX}GEMINI_API_KEY")));
            }
            Provider::OpenAI if openai_api_key.is_none() => {
                return Err(ConfigurationError::MissingVar(format!("{ENV_PREFIX}OPENAI_API_KEY")));
            }
            _ => {}
        }

        let request_timeout_secs = vars
            .parse("REQUEST_TIMEOUT_SECS", parse_number::<u64>)?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(vars.invalid("REQUEST_TIMEOUT_SECS", "must be at least 1"));
        }

        let temperature = vars
            .parse("TEMPERATURE", parse_number::<f32>)?
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(vars.invalid("TEMPERATURE", "must be between 0 and 2"));
        }

        let max_tokens = vars
            .parse("MAX_TOKENS", parse_number::<u32>)?
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(vars.invalid("MAX_TOKENS", "must be at least 1"));
        }

        let max_questions = vars
            .parse("MAX_QUESTIONS", parse_number::<usize>)?
            .unwrap_or(DEFAULT_MAX_QUESTIONS);
        if max_questions == 0 {
            return Err(vars.invalid("MAX_QUESTIONS", "must be at least 1"));
        }

        let generation_attempts = vars
            .parse("GENERATION_ATTEMPTS", parse_number::<u32>)?
            .unwrap_or(DEFAULT_GENERATION_ATTEMPTS);
        if !(1..=MAX_GENERATION_ATTEMPTS).contains(&generation_attempts) {
            return Err(vars.invalid(
                "GENERATION_ATTEMPTS",
                &format!("must be between 1 and {MAX_GENERATION_ATTEMPTS}"),
            ));
        }

        let max_audio_bytes = vars
            .parse("MAX_AUDIO_BYTES", parse_number::<usize>)?
            .unwrap_or(DEFAULT_MAX_AUDIO_BYTES);
        if max_audio_bytes == 0 {
            return Err(vars.invalid("MAX_AUDIO_BYTES", "must be at least 1"));
        }

        let enable_scoring = vars.parse("ENABLE_SCORING", parse_bool)?.unwrap_or(true);
        let conversational = vars.parse("CONVERSATIONAL", parse_bool)?.unwrap_or(false);

        let debug = vars.parse("DEBUG", parse_bool)?.unwrap_or(false);
        let log_level = vars
            .parse("LOG_LEVEL", |s| {
                s.parse::<Level>()
                    .map_err(|_| "expected TRACE, DEBUG, INFO, WARN or ERROR".to_string())
            })?
            .unwrap_or(Level::INFO);
        let log_level = if debug && log_level != Level::TRACE {
            Level::DEBUG
        } else {
            log_level
        };

        let chat_model = vars
            .get("CHAT_MODEL")
            .unwrap_or_else(|| provider.default_chat_model().to_string());
        let transcription_model = vars
            .get("TRANSCRIPTION_MODEL")
            .unwrap_or(defaults.model.transcription_model);

        Ok(Self {
            api: ApiSettings {
                provider,
                gemini_api_key,
                openai_api_key,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
            model: ModelSettings {
                chat_model,
                temperature,
                max_tokens,
                transcription_model,
            },
            interview: InterviewSettings {
                max_questions,
                generation_attempts,
                score_bounds: defaults.interview.score_bounds,
                enable_scoring,
                conversational,
                prompts_dir: vars.get("PROMPTS_DIR").map(PathBuf::from),
            },
            transcription: TranscriptionSettings { max_audio_bytes },
            debug,
            log_level,
        })
    }

    /// Whisper is only reachable with an OpenAI key; otherwise audio goes to Gemini.
    pub fn has_openai_transcription(&self) -> bool {
        self.api.openai_api_key.is_some()
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{ENV_PREFIX}{name}"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(
        &self,
        name: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<Option<T>, ConfigurationError> {
        self.get(name)
            .map(|raw| parse(&raw).map_err(|reason| self.invalid(name, &reason)))
            .transpose()
    }

    fn invalid(&self, name: &str, reason: &str) -> ConfigurationError {
        ConfigurationError::InvalidValue {
            var: format!("{ENV_PREFIX}{name}"),
            reason: reason.to_string(),
        }
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Result<T, String> {
    raw.parse::<T>().map_err(|_| format!("'{raw}' is not a valid number"))
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("'{raw}' is not a boolean")),
    }
}
