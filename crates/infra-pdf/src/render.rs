// PDF Rendering (printpdf)
//
// One output page per input string, explicit newlines only. Latin-1
// content renders with the builtin Helvetica; anything beyond U+00FF
// switches the whole document to the fetched fallback font.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use tracing::debug;

use transdoc_core::domain::StepError;
use transdoc_core::port::PdfRenderer;

use crate::font::FontFetcher;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_MM: f32 = 6.0;

pub struct PrintpdfRenderer {
    fonts: Arc<dyn FontFetcher>,
}

impl PrintpdfRenderer {
    pub fn new(fonts: Arc<dyn FontFetcher>) -> Self {
        Self { fonts }
    }

    fn needs_fallback_font(pages: &[String]) -> bool {
        pages
            .iter()
            .any(|page| page.chars().any(|c| c as u32 > 0xFF))
    }

    // `PdfDocumentReference` is not `Send`, so the font bytes must be
    // fetched before the document exists; no await may cross `doc`.
    fn load_font(
        doc: &PdfDocumentReference,
        fallback_bytes: Option<Vec<u8>>,
    ) -> Result<IndirectFontRef, StepError> {
        if let Some(bytes) = fallback_bytes {
            doc.add_external_font(&mut Cursor::new(bytes))
                .map_err(|e| StepError::permanent(format!("fallback font rejected: {e}")))
        } else {
            doc.add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| StepError::permanent(format!("builtin font load failed: {e}")))
        }
    }
}

#[async_trait]
impl PdfRenderer for PrintpdfRenderer {
    async fn render_pages(&self, pages: &[String]) -> Result<Vec<u8>, StepError> {
        if pages.is_empty() {
            return Err(StepError::permanent("nothing to render".to_string()));
        }

        let needs_fallback = Self::needs_fallback_font(pages);
        debug!(
            page_count = pages.len(),
            fallback_font = needs_fallback,
            "Rendering translated document"
        );

        // The font is resolved once, before any page is laid out.
        let fallback_bytes = if needs_fallback {
            Some(self.fonts.fetch().await?)
        } else {
            None
        };

        let (doc, first_page, first_layer) = PdfDocument::new(
            "Translated Document",
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "content",
        );
        let font = Self::load_font(&doc, fallback_bytes)?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

        for (index, page_text) in pages.iter().enumerate() {
            if index > 0 {
                let (page, layer_index) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
                layer = doc.get_page(page).get_layer(layer_index);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }

            for line in page_text.lines() {
                if y < MARGIN_MM {
                    // Vertical overflow continues on a fresh page.
                    let (page, layer_index) =
                        doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
                    layer = doc.get_page(page).get_layer(layer_index);
                    y = PAGE_HEIGHT_MM - MARGIN_MM;
                }
                if !line.is_empty() {
                    layer.use_text(line, FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
                }
                y -= LINE_HEIGHT_MM;
            }
        }

        doc.save_to_bytes()
            .map_err(|e| StepError::permanent(format!("PDF serialization failed: {e}")))
    }
}
