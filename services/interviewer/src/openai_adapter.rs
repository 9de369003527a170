use anyhow::{Context, Result};
use async_trait::async_trait;
use interviewer_core::backend::{CompletionRequest, LlmBackend, SpeechInput, SpeechToText};
use interviewer_core::settings::Settings;
use openai_api::types::{ChatMessage, ChatRequest, ResponseFormat};
use openai_api::{Client, Config, Stats};
use secrecy::{ExposeSecret, SecretString};

/// Implements the core backend traits over the OpenAI chat and transcription endpoints.
pub struct OpenAIAdapter {
    client: Client,
}

impl OpenAIAdapter {
    pub fn new(settings: &Settings, chat_model: &str) -> Result<Self> {
        let api_key = settings
            .api
            .openai_api_key
            .as_ref()
            .map(|key| SecretString::from(key.expose_secret().to_string()))
            .context("OpenAI API key is not configured")?;

        let config = Config::builder()
            .with_api_key(api_key)
            .with_chat_model(chat_model)
            .with_transcription_model(&settings.model.transcription_model)
            .with_timeout(settings.api.request_timeout)
            .build();
        let client = Client::new(config).context("Failed to create OpenAI client")?;

        tracing::info!(
            "OpenAI adapter ready, chat model={}, transcription model={}",
            chat_model,
            settings.model.transcription_model
        );
        Ok(Self { client })
    }

    pub fn stats(&self) -> Result<Stats> {
        self.client.stats()
    }
}

fn chat_request(model: &str, request: &CompletionRequest) -> ChatRequest {
    let chat = ChatRequest::new(model)
        .with_message(ChatMessage::user(&request.prompt))
        .with_temperature(request.temperature)
        .with_max_tokens(request.max_tokens);
    if request.json_output {
        chat.with_response_format(ResponseFormat::json_object())
    } else {
        chat
    }
}

#[async_trait]
impl LlmBackend for OpenAIAdapter {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let chat = chat_request(self.client.config().chat_model(), &request);
        self.client.chat_content(&chat).await
    }
}

#[async_trait]
impl SpeechToText for OpenAIAdapter {
    async fn transcribe(&self, input: SpeechInput) -> Result<String> {
        let file_name = format!("answer.{}", input.format.extension());
        self.client
            .transcribe(input.bytes, &file_name, input.format.mime_type())
            .await
    }
}
