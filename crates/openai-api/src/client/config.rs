use crate::client::consts::{BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_TIMEOUT_SECS, DEFAULT_TRANSCRIPTION_MODEL};
use secrecy::SecretString;
use std::time::Duration;

pub struct Config {
    base_url: String,
    api_key: SecretString,
    chat_model: String,
    transcription_model: String,
    timeout: Duration,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.config.api_key = api_key;
        self
    }

    pub fn with_chat_model(mut self, model: &str) -> Self {
        self.config.chat_model = model.to_string();
        self
    }

    pub fn with_transcription_model(mut self, model: &str) -> Self {
        self.config.transcription_model = model.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    // The key is left empty here; callers always supply one through the builder.
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key: SecretString::from(String::new()),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn transcription_model(&self) -> &str {
        &self.transcription_model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::builder()
            .with_base_url("http://localhost:8080/v1/")
            .with_api_key(SecretString::from("sk-test".to_string()))
            .with_chat_model("gpt-4o-mini")
            .with_transcription_model("gpt-4o-mini-transcribe")
            .with_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.base_url(), "http://localhost:8080/v1");
        assert_eq!(config.api_key().expose_secret(), "sk-test");
        assert_eq!(config.chat_model(), "gpt-4o-mini");
        assert_eq!(config.transcription_model(), "gpt-4o-mini-transcribe");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn defaults_point_at_public_api() {
        let config = Config::new();
        assert_eq!(config.base_url(), BASE_URL);
        assert_eq!(config.chat_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(config.transcription_model(), DEFAULT_TRANSCRIPTION_MODEL);
    }
}
