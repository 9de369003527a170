pub const BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
pub const TRANSCRIPTIONS_PATH: &str = "/audio/transcriptions";
