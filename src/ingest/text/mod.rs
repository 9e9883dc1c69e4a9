pub mod pdf;
pub mod splitter;

pub use pdf::PdfExtractor;
pub use splitter::RecursiveSplitter;

/// Splits prose into bounded windows. Used for plain text and PDF text,
/// which do not go through the syntax-aware chunker.
pub trait TextSplitter: Send + Sync {
    fn split_text(&self, text: &str) -> Vec<String>;
}
