// PDF Text Extraction (lopdf)

use lopdf::Document;
use tracing::debug;

use transdoc_core::domain::StepError;
use transdoc_core::port::{PdfExtractor, PAGE_BREAK};

/// Extracts per-page text with lopdf. A document the library cannot
/// parse is corrupt input, not a retry candidate.
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LopdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for LopdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, StepError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| StepError::permanent(format!("unreadable PDF: {e}")))?;

        let pages = doc.get_pages();
        debug!(page_count = pages.len(), "Extracting PDF text");

        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            let text = doc
                .extract_text(&[*page_number])
                .map_err(|e| {
                    StepError::permanent(format!("text extraction failed on page {page_number}: {e}"))
                })?;
            texts.push(text.trim_end().to_string());
        }

        Ok(texts.join(PAGE_BREAK))
    }
}
