//! Text extraction from raw document bytes

use crate::error::{Error, Result};
use crate::types::Page;

/// Trait for turning raw document bytes into ordered pages of text
///
/// Implementations:
/// - `DocumentExtractor`: PDF via lopdf/pdf-extract, UTF-8 plain text otherwise
pub trait TextExtractor: Send + Sync {
    /// Extract pages, 1-based page numbers, in document order.
    ///
    /// Individual pages that fail to extract come back with empty text;
    /// a document that yields nothing at all is an error.
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>>;

    /// Extractor name for logging
    fn name(&self) -> &str;
}

/// Default extractor: sniffs PDFs by magic bytes, falls back to plain text
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pdf(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let page_map = doc.get_pages();
                let mut pages = Vec::with_capacity(page_map.len());

                for (&page_number, _) in page_map.iter() {
                    let text = match doc.extract_text(&[page_number]) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(
                                filename,
                                page = page_number,
                                "page extraction failed, keeping empty page: {}",
                                e
                            );
                            String::new()
                        }
                    };
                    pages.push(Page::new(page_number, text));
                }

                tracing::debug!(filename, pages = pages.len(), "extracted pdf pages");
                Ok(pages)
            }
            Err(e) => {
                // Some PDFs that lopdf rejects still extract as a whole.
                tracing::warn!(filename, "lopdf parse failed ({}), trying pdf-extract", e);
                let text = pdf_extract::extract_text_from_mem(data)
                    .map_err(|e| Error::Extraction(format!("pdf extraction failed: {}", e)))?;
                Ok(vec![Page::new(1, text)])
            }
        }
    }

    fn extract_plain_text(&self, data: &[u8]) -> Vec<Page> {
        let text = String::from_utf8_lossy(data).into_owned();
        vec![Page::new(1, text)]
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        if data.is_empty() {
            return Err(Error::Extraction("document is empty".into()));
        }

        let pages = if data.starts_with(b"%PDF") {
            self.extract_pdf(filename, data)?
        } else {
            self.extract_plain_text(data)
        };

        if pages.is_empty() {
            return Err(Error::Extraction("document contains no pages".into()));
        }
        if pages.iter().all(Page::is_blank) {
            return Err(Error::Extraction(
                "document contains no extractable text".into(),
            ));
        }

        Ok(pages)
    }

    fn name(&self) -> &str {
        "document"
    }
}
