// Transdoc OpenAI Translation Provider

mod client;

pub use client::{OpenAiConfig, OpenAiTranslator};
