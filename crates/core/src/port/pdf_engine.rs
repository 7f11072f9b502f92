// PDF Engine Ports (Interface)
//
// Extraction is pure and synchronous. Rendering is async because the
// Unicode fallback font may be fetched over the network.

use crate::domain::StepError;
use async_trait::async_trait;

/// Sentinel joining/splitting page texts
pub const PAGE_BREAK: &str = "\n\n";

/// Extracts plain text from a PDF, pages joined by [`PAGE_BREAK`].
pub trait PdfExtractor: Send + Sync {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, StepError>;
}

/// Renders one output page per input string. Wrapping follows explicit
/// newlines only; vertical overflow starts a new page.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pages(&self, pages: &[String]) -> Result<Vec<u8>, StepError>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Extractor returning a fixed result
    pub struct MockPdfExtractor {
        result: Mutex<Result<String, StepError>>,
    }

    impl MockPdfExtractor {
        pub fn returning(text: impl Into<String>) -> Self {
            Self {
                result: Mutex::new(Ok(text.into())),
            }
        }

        pub fn failing(err: StepError) -> Self {
            Self {
                result: Mutex::new(Err(err)),
            }
        }
    }

    impl PdfExtractor for MockPdfExtractor {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<String, StepError> {
            self.result.lock().unwrap().clone()
        }
    }

    /// Renderer producing recognizable fake bytes
    pub struct MockPdfRenderer {
        error: Option<StepError>,
    }

    impl MockPdfRenderer {
        pub fn new() -> Self {
            Self { error: None }
        }

        pub fn failing(err: StepError) -> Self {
            Self { error: Some(err) }
        }
    }

    impl Default for MockPdfRenderer {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PdfRenderer for MockPdfRenderer {
        async fn render_pages(&self, pages: &[String]) -> Result<Vec<u8>, StepError> {
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            Ok(format!("%PDF-mock {} pages\n{}", pages.len(), pages.join(PAGE_BREAK))
                .into_bytes())
        }
    }
}
