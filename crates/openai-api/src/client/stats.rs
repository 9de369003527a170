use crate::types::Usage;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    requests: u32,
    total_tokens: u32,
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_request(&mut self) {
        self.requests += 1;
    }

    pub(crate) fn update_usage(&mut self, usage: &Usage) {
        self.total_tokens += usage.total_tokens();
        self.prompt_tokens += usage.prompt_tokens();
        self.completion_tokens += usage.completion_tokens();
    }

    pub fn requests(&self) -> u32 {
        self.requests
    }

    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }

    pub fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    pub fn completion_tokens(&self) -> u32 {
        self.completion_tokens
    }
}
