use crate::error::{DocsplitError, Result};

/// Page-based PDF text extractor.
pub struct PdfExtractor;

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of one non-empty PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// Page number (1-based).
    pub number: usize,
    pub text: String,
}

impl PdfExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract the pages of an in-memory PDF. `source` names it in errors.
    pub fn extract_from_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<PdfPage>> {
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocsplitError::Parse {
            path: source.into(),
            detail: format!("PDF extraction error: {e}"),
        })?;
        Ok(self.split_pages(&text))
    }

    /// Split extracted text on form feeds; blank pages are dropped but keep
    /// their place in the numbering.
    #[must_use]
    pub fn split_pages(&self, text: &str) -> Vec<PdfPage> {
        text.split('\x0C')
            .enumerate()
            .filter_map(|(i, page)| {
                let trimmed = page.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(PdfPage {
                        number: i + 1,
                        text: trimmed.to_string(),
                    })
                }
            })
            .collect()
    }
}
