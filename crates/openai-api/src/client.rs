use crate::types::{self, ChatRequest, ChatResponse, ErrorResponse, TranscriptionResponse};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use std::sync::{Arc, Mutex};

mod config;
mod consts;
mod stats;

pub use config::{Config, ConfigBuilder};
pub use stats::Stats;

/// Client for the OpenAI REST endpoints used by the interviewer:
/// chat completions and audio transcriptions.
pub struct Client {
    config: Config,
    http: reqwest::Client,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            http,
            stats: Arc::new(Mutex::new(Stats::new())),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Return a snapshot of the accumulated usage.
    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    /// Sends a `chat/completions` request and returns the raw response.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}{}", self.config.base_url(), consts::CHAT_COMPLETIONS_PATH);
        tracing::debug!("sending chat completion, model={}", request.model());

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key().expose_secret())
            .json(request)
            .send()
            .await
            .context("Chat completion request failed")?;

        let resp = check_status(resp).await?;
        let body = resp
            .json::<ChatResponse>()
            .await
            .context("Failed to decode chat completion response")?;

        self.record(body.usage.as_ref());
        Ok(body)
    }

    /// Sends a chat request and returns the content of the first choice.
    pub async fn chat_content(&self, request: &ChatRequest) -> Result<String> {
        let resp = self.chat(request).await?;
        let content = resp
            .first_content()
            .ok_or_else(|| anyhow::anyhow!("No response from LLM"))?;
        Ok(content.to_string())
    }

    /// Uploads an audio file to `audio/transcriptions` and returns the transcript text.
    pub async fn transcribe(&self, audio: Vec<u8>, file_name: &str, mime_type: &str) -> Result<String> {
        let url = format!("{}{}", self.config.base_url(), consts::TRANSCRIPTIONS_PATH);
        tracing::debug!(
            "sending transcription, model={}, bytes={}",
            self.config.transcription_model(),
            audio.len()
        );

        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .context("Invalid audio mime type")?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.config.transcription_model().to_string())
            .text("response_format", "json");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key().expose_secret())
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let resp = check_status(resp).await?;
        let body = resp
            .json::<TranscriptionResponse>()
            .await
            .context("Failed to decode transcription response")?;

        self.record(None);
        Ok(body.text)
    }

    fn record(&self, usage: Option<&types::Usage>) {
        if let Ok(mut stats_guard) = self.stats.lock() {
            stats_guard.record_request();
            if let Some(usage) = usage {
                stats_guard.update_usage(usage);
                tracing::debug!(
                    "total_tokens: {}, prompt_tokens: {}, completion_tokens: {}",
                    usage.total_tokens(),
                    usage.prompt_tokens(),
                    usage.completion_tokens()
                );
            }
        } else {
            tracing::error!("failed to update stats");
        }
    }
}

// Turns a non-success response into an error carrying the API's own message when it sent one.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    Err(anyhow::anyhow!("{}", describe_error(status, &text)))
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => format!("OpenAI API error ({}): {}", status, error.error.message()),
        Err(_) if body.trim().is_empty() => format!("OpenAI API error ({})", status),
        Err(_) => format!("OpenAI API error ({}): {}", status, body.trim()),
    }
}
