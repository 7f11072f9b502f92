// OpenAI Chat Completions Translation Client
//
// Error tagging drives the retry policy upstream: rate limits, server
// errors and network failures are transient; authentication and request
// shape problems are permanent.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use transdoc_core::domain::{Language, StepError};
use transdoc_core::port::{TranslationOutcome, TranslationProvider};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
        }
    }
}

pub struct OpenAiTranslator {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiTranslator {
    pub fn new(config: OpenAiConfig) -> Result<Self, StepError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StepError::permanent(format!("HTTP client init failed: {e}")))?;

        Ok(Self { client, config })
    }

    fn system_prompt(source: Language, target: Language) -> String {
        format!(
            "You are a professional translator. Translate the user's text from {source} to {target}. \
             Preserve the line breaks and paragraph structure of the input exactly. \
             Output only the translated text, with no commentary.",
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl TranslationProvider for OpenAiTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationOutcome, StepError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(StepError::permanent(
                "translation provider API key is not configured".to_string(),
            ));
        };

        let system = Self::system_prompt(source, target);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!(model = %self.config.model, input_chars = text.len(), "Calling translation provider");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // Timeouts and connection failures are worth retrying
                StepError::transient(format!("provider request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("provider returned {status}: {body}");
            warn!(status = %status, "Translation provider error");

            return if status.as_u16() == 429 || status.is_server_error() {
                Err(StepError::transient(message))
            } else {
                // 401/403 and other 4xx: retrying the same request is futile
                Err(StepError::permanent(message))
            };
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| StepError::transient(format!("provider response unreadable: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StepError::permanent("provider returned no choices".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(TranslationOutcome {
            text: choice.message.content,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }

    fn key_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| key.len() >= 20)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_a_permanent_failure_without_network() {
        let translator = OpenAiTranslator::new(OpenAiConfig::default()).unwrap();
        let err = translator
            .translate("Bonjour", Language::French, Language::Arabic)
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(!translator.key_configured());
    }

    #[test]
    fn short_keys_are_not_plausible() {
        let translator = OpenAiTranslator::new(OpenAiConfig {
            api_key: Some("short".to_string()),
            ..OpenAiConfig::default()
        })
        .unwrap();
        assert!(!translator.key_configured());

        let translator = OpenAiTranslator::new(OpenAiConfig {
            api_key: Some("sk-0123456789abcdefghijklmnop".to_string()),
            ..OpenAiConfig::default()
        })
        .unwrap();
        assert!(translator.key_configured());
    }

    #[test]
    fn prompt_names_both_languages() {
        let prompt = OpenAiTranslator::system_prompt(Language::French, Language::Arabic);
        assert!(prompt.contains("french"));
        assert!(prompt.contains("arabic"));
    }
}
