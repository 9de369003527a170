mod client;
pub mod types;

pub use client::{Client, Config, ConfigBuilder, Stats};
