//! Seams to the hosted models.
//!
//! The engine and transcriber only see these traits. The service crate
//! implements them over the Gemini and OpenAI REST clients, and tests
//! substitute `mockall` mocks.

use crate::transcriber::AudioFormat;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// A single-turn text completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the model to reply with a JSON object.
    pub json_output: bool,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechInput {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Returns the raw transcript, possibly empty.
    async fn transcribe(&self, input: SpeechInput) -> Result<String>;
}
