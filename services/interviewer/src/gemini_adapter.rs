use anyhow::{Context, Result};
use async_trait::async_trait;
use gemini_api::GeminiClient;
use gemini_api::types::{GenerationConfig, UsageMetadata};
use interviewer_core::backend::{CompletionRequest, LlmBackend, SpeechInput, SpeechToText};
use interviewer_core::settings::Settings;
use secrecy::{ExposeSecret, SecretString};

const TOP_P: f32 = 0.8;
const TOP_K: u32 = 40;
const JSON_MIME_TYPE: &str = "application/json";

const TRANSCRIBE_INSTRUCTION: &str = "Transcribe the speech in this audio clip verbatim. \
Reply with the transcript only, without commentary or formatting. \
If there is no intelligible speech, reply with an empty message.";

/// Implements the core backend traits over Gemini `generateContent`.
pub struct GeminiAdapter {
    client: GeminiClient,
}

impl GeminiAdapter {
    pub fn new(settings: &Settings, model: &str) -> Result<Self> {
        let api_key = settings
            .api
            .gemini_api_key
            .as_ref()
            .map(|key| SecretString::from(key.expose_secret().to_string()))
            .context("Gemini API key is not configured")?;

        let client = gemini_api::connect(api_key, model, settings.api.request_timeout)
            .context("Failed to create GeminiAdapter")?;
        Ok(Self { client })
    }

    pub fn usage(&self) -> UsageMetadata {
        self.client.usage()
    }
}

fn generation_config(request: &CompletionRequest) -> GenerationConfig {
    GenerationConfig {
        temperature: Some(request.temperature),
        max_output_tokens: Some(request.max_tokens),
        top_p: Some(TOP_P),
        top_k: Some(TOP_K),
        response_mime_type: request.json_output.then(|| JSON_MIME_TYPE.to_string()),
    }
}

#[async_trait]
impl LlmBackend for GeminiAdapter {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.client
            .generate_text(&request.prompt, generation_config(&request))
            .await
    }
}

#[async_trait]
impl SpeechToText for GeminiAdapter {
    async fn transcribe(&self, input: SpeechInput) -> Result<String> {
        self.client
            .generate_from_audio(TRANSCRIBE_INSTRUCTION, &input.bytes, input.format.mime_type())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::error::TranscriptionError;
    use interviewer_core::transcriber::Transcriber;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one HTTP request with `body` as a JSON response and returns the base URL.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn adapter(base_url: &str) -> GeminiAdapter {
        let client = gemini_api::connect(
            SecretString::from("g-key".to_string()),
            "gemini-2.0-flash",
            std::time::Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url);
        GeminiAdapter { client }
    }

    #[tokio::test]
    async fn silent_audio_becomes_an_empty_transcript() {
        // Arrange: Gemini follows the instruction and answers with nothing.
        let base_url = serve_once(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": ""}]}, "finishReason": "STOP"}]}"#,
        )
        .await;
        let transcriber = Transcriber::new(Arc::new(adapter(&base_url)), &Settings::default());

        // Act
        let err = transcriber.transcribe(vec![7; 64], "mp3").await.unwrap_err();

        // Assert
        assert!(matches!(err, TranscriptionError::EmptyTranscript));
    }

    #[tokio::test]
    async fn spoken_audio_is_returned_as_text() {
        let base_url = serve_once(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "I shipped it on time."}]}, "finishReason": "STOP"}], "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 6, "totalTokenCount": 18}}"#,
        )
        .await;
        let adapter = adapter(&base_url);

        let text = adapter
            .transcribe(SpeechInput {
                bytes: vec![7; 64],
                format: "mp3".parse().unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(text, "I shipped it on time.");
        assert_eq!(adapter.usage().total_token_count, 18);
    }

    #[test]
    fn json_mode_requests_json_mime_type() {
        let config = generation_config(&CompletionRequest {
            prompt: String::new(),
            temperature: 0.7,
            max_tokens: 1000,
            json_output: true,
        });
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["maxOutputTokens"], 1000);
        assert_eq!(json["topK"], 40);
        assert_eq!(json["responseMimeType"], "application/json");
    }

    #[test]
    fn text_mode_leaves_mime_type_unset() {
        let config = generation_config(&CompletionRequest {
            prompt: String::new(),
            temperature: 0.0,
            max_tokens: 10,
            json_output: false,
        });
        assert!(config.response_mime_type.is_none());
        assert_eq!(config.top_p, Some(0.8));
    }

    #[test]
    fn requires_api_key() {
        assert!(GeminiAdapter::new(&Settings::default(), "gemini-2.0-flash").is_err());
    }
}
