use crate::types::{
    Content, ErrorResponse, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SafetySetting, UsageMetadata,
};
use anyhow::{Context, Result};
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Mutex;
use std::time::Duration;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";
const FINISH_STOP: &str = "STOP";

/// A client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    usage: Mutex<UsageMetadata>,
}

/// Builds a client for the given key and model.
pub fn connect(api_key: SecretString, model: &str, timeout: Duration) -> Result<GeminiClient> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client for Gemini")?;

    tracing::info!("Gemini client ready, model={}", model);
    Ok(GeminiClient {
        http,
        base_url: BASE_URL.to_string(),
        api_key,
        model: model.to_string(),
        usage: Mutex::new(UsageMetadata::default()),
    })
}

impl GeminiClient {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Token usage accumulated over every successful request.
    pub fn usage(&self) -> UsageMetadata {
        self.usage
            .lock()
            .map(|usage| usage.clone())
            .unwrap_or_default()
    }

    /// Sends a raw `generateContent` request.
    pub async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        tracing::debug!("sending generateContent, model={}", self.model);

        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("{}", describe_error(status, &body)));
        }

        let body = resp
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to decode Gemini response")?;

        if let Some(usage) = &body.usage_metadata {
            if let Ok(mut total) = self.usage.lock() {
                total.prompt_token_count += usage.prompt_token_count;
                total.candidates_token_count += usage.candidates_token_count;
                total.total_token_count += usage.total_token_count;
            }
        }
        Ok(body)
    }

    /// Sends a single-turn text prompt and returns the model's text.
    pub async fn generate_text(&self, prompt: &str, config: GenerationConfig) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            generation_config: Some(config),
            safety_settings: SafetySetting::defaults(),
        };
        let resp = self.generate(&request).await?;
        extract_text(&resp)
    }

    /// Sends audio inline with an instruction and returns the model's text.
    ///
    /// A candidate that finished normally with no text yields an empty string, since
    /// silence is a valid answer to a transcription instruction.
    pub async fn generate_from_audio(&self, instruction: &str, audio: &[u8], mime_type: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text(instruction),
                Part::inline_data(mime_type, encoded),
            ])],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                ..Default::default()
            }),
            safety_settings: SafetySetting::defaults(),
        };
        let resp = self.generate(&request).await?;
        extract_transcript(&resp)
    }
}

fn extract_transcript(resp: &GenerateContentResponse) -> Result<String> {
    let finished = resp
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        == Some(FINISH_STOP);
    if finished && resp.block_reason().is_none() && resp.text().is_none() {
        tracing::debug!("Gemini heard no speech in the audio");
        return Ok(String::new());
    }
    extract_text(resp)
}

fn extract_text(resp: &GenerateContentResponse) -> Result<String> {
    if let Some(reason) = resp.block_reason() {
        return Err(anyhow::anyhow!("Gemini blocked the prompt: {}", reason));
    }
    resp.text().ok_or_else(|| {
        let finish = resp
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("none");
        anyhow::anyhow!("Empty response from Gemini (finish reason: {})", finish)
    })
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => format!("Gemini API error ({}): {}", status, error.error.message),
        Err(_) => format!("Gemini API error ({}): {}", status, body.trim()),
    }
}
