pub mod backends;
pub mod gemini_adapter;
pub mod openai_adapter;
pub mod shell;

pub use backends::Backends;
pub use shell::{Shell, ShellCommand};
