use crate::gemini_adapter::GeminiAdapter;
use crate::openai_adapter::OpenAIAdapter;
use anyhow::Result;
use interviewer_core::backend::{LlmBackend, SpeechToText};
use interviewer_core::settings::{DEFAULT_OPENAI_CHAT_MODEL, Provider, Settings};
use std::sync::Arc;

/// The concrete backends selected by the settings.
pub struct Backends {
    pub llm: Arc<dyn LlmBackend>,
    pub speech: Arc<dyn SpeechToText>,
    openai: Option<Arc<OpenAIAdapter>>,
    gemini: Option<Arc<GeminiAdapter>>,
}

impl Backends {
    /// The chat provider comes from the settings. Transcription uses Whisper whenever an
    /// OpenAI key is present and falls back to Gemini audio input otherwise.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let chat_model = settings.model.chat_model.as_str();

        let openai = match settings.api.provider {
            Provider::OpenAI => Some(Arc::new(OpenAIAdapter::new(settings, chat_model)?)),
            Provider::Gemini if settings.has_openai_transcription() => {
                Some(Arc::new(OpenAIAdapter::new(settings, DEFAULT_OPENAI_CHAT_MODEL)?))
            }
            Provider::Gemini => None,
        };
        let gemini = match settings.api.provider {
            Provider::Gemini => Some(Arc::new(GeminiAdapter::new(settings, chat_model)?)),
            Provider::OpenAI => None,
        };

        let llm: Arc<dyn LlmBackend> = match (&gemini, &openai) {
            (Some(gemini), _) => gemini.clone(),
            (None, Some(openai)) => openai.clone(),
            (None, None) => anyhow::bail!("no LLM backend could be configured"),
        };
        let speech: Arc<dyn SpeechToText> = match (&openai, &gemini) {
            (Some(openai), _) => openai.clone(),
            (None, Some(gemini)) => gemini.clone(),
            (None, None) => anyhow::bail!("no speech-to-text backend could be configured"),
        };

        tracing::info!(
            "using {:?} for questions and scoring, {} for transcription",
            settings.api.provider,
            if openai.is_some() { "Whisper" } else { "Gemini" }
        );
        Ok(Self {
            llm,
            speech,
            openai,
            gemini,
        })
    }

    /// Human-readable token usage per provider.
    pub fn usage_report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(gemini) = &self.gemini {
            let usage = gemini.usage();
            lines.push(format!(
                "Gemini: {} tokens ({} prompt, {} output)",
                usage.total_token_count, usage.prompt_token_count, usage.candidates_token_count
            ));
        }
        if let Some(openai) = &self.openai {
            match openai.stats() {
                Ok(stats) => lines.push(format!(
                    "OpenAI: {} request(s), {} tokens ({} prompt, {} completion)",
                    stats.requests(),
                    stats.total_tokens(),
                    stats.prompt_tokens(),
                    stats.completion_tokens()
                )),
                Err(e) => tracing::warn!("could not read OpenAI usage: {}", e),
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn settings(provider: Provider, gemini: bool, openai: bool) -> Settings {
        let mut settings = Settings::default();
        settings.api.provider = provider;
        if gemini {
            settings.api.gemini_api_key = Some(SecretString::from("g-key".to_string()));
        }
        if openai {
            settings.api.openai_api_key = Some(SecretString::from("sk-test".to_string()));
        }
        settings
    }

    #[test]
    fn gemini_only_uses_gemini_for_everything() {
        let backends = Backends::from_settings(&settings(Provider::Gemini, true, false)).unwrap();
        assert!(backends.openai.is_none());
        assert_eq!(backends.usage_report().len(), 1);
    }

    #[test]
    fn openai_key_enables_whisper_alongside_gemini() {
        let backends = Backends::from_settings(&settings(Provider::Gemini, true, true)).unwrap();
        assert!(backends.openai.is_some());
        assert!(backends.gemini.is_some());
        assert_eq!(backends.usage_report().len(), 2);
    }

    #[test]
    fn openai_provider_ignores_gemini() {
        let backends = Backends::from_settings(&settings(Provider::OpenAI, true, true)).unwrap();
        assert!(backends.gemini.is_none());
        assert!(backends.usage_report()[0].starts_with("OpenAI: 0 request(s)"));
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(Backends::from_settings(&settings(Provider::OpenAI, true, false)).is_err());
    }
}
