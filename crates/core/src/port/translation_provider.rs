// Translation Provider Port (Interface)
//
// Thin, swappable wrapper around an external LLM translation API.

use crate::domain::{Language, StepError};
use async_trait::async_trait;

/// Result of one provider call, including token usage for cost accounting
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text`, preserving line/paragraph structure as much as the
    /// provider allows. Timeouts, rate limits and 5xx are transient;
    /// auth/config errors are permanent.
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationOutcome, StepError>;

    /// Whether credentials are present and plausible (health check)
    fn key_configured(&self) -> bool;

    fn name(&self) -> &'static str;
}

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted provider: pops queued results, falls back to echo-success.
    pub struct MockTranslationProvider {
        script: Mutex<VecDeque<Result<TranslationOutcome, StepError>>>,
        calls: AtomicUsize,
        key_configured: bool,
    }

    impl MockTranslationProvider {
        pub fn new_success() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                key_configured: true,
            }
        }

        pub fn without_key() -> Self {
            Self {
                key_configured: false,
                ..Self::new_success()
            }
        }

        /// Queue a result for the next call(s), oldest first
        pub fn push_result(&self, result: Result<TranslationOutcome, StepError>) {
            self.script.lock().unwrap().push_back(result);
        }

        pub fn push_failure(&self, err: StepError) {
            self.push_result(Err(err));
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranslationProvider for MockTranslationProvider {
        async fn translate(
            &self,
            text: &str,
            _source: Language,
            target: Language,
        ) -> Result<TranslationOutcome, StepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(scripted) = self.script.lock().unwrap().pop_front() {
                return scripted;
            }
            let tokens = (text.len() / 4).max(1) as u32;
            Ok(TranslationOutcome {
                text: format!("[{}] {}", target.as_str(), text),
                input_tokens: tokens,
                output_tokens: tokens,
            })
        }

        fn key_configured(&self) -> bool {
            self.key_configured
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }
}
