// Pedantic lint configuration for the crate.
// Most of these are reasonable but too strict for this codebase:
// - cast_possible_truncation: Chunk and token counts stay far below u32 limits
// - cast_precision_loss: Acceptable for token estimates
// - missing_errors_doc: Error handling is self-evident from Result types
// - missing_panics_doc: Panics are rare and documented inline
// - items_after_statements: Output structs are clearer near their usage
// - too_many_lines: The greedy chunk loop reads best in one piece
// - option_if_let_else: if-let is often clearer
// - needless_pass_by_value: Sometimes clearer semantically
// - case_sensitive_file_extension_comparisons: Extensions are normalized upstream
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::items_after_statements,
    clippy::too_many_lines,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::case_sensitive_file_extension_comparisons
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod pipeline;
