pub mod document;
pub mod tokens;

pub use document::{DocKind, Document, DocumentMetadata};
pub use tokens::{CharCounter, EstimateCounter, TokenCounter};
