pub mod client;
pub mod types;

pub use client::{connect, GeminiClient, BASE_URL, DEFAULT_MODEL};
