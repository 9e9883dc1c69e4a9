use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::error::{DocsplitError, Result};
use crate::ingest::loader::Loader;
use crate::ingest::scanner::{Scanner, SkipReason};
use crate::models::document::Document;

/// A file that produced no documents, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Statistics and documents from an ingest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestResult {
    pub files_scanned: usize,
    pub files_loaded: usize,
    /// Total files skipped (sum of all skip categories).
    pub files_skipped: usize,
    pub chunks_created: usize,
    /// Files skipped due to unsupported extension or language.
    pub skipped_unsupported: usize,
    /// Files skipped because they exceed `max_file_size_mb`.
    pub skipped_too_large: usize,
    /// Files skipped because content is not valid UTF-8.
    pub skipped_non_utf8: usize,
    /// Files skipped due to IO errors.
    pub skipped_io_error: usize,
    /// Files skipped because their source or PDF did not parse.
    pub skipped_parse_error: usize,
    pub skipped_files: Vec<SkippedFile>,
    /// Documents in file order, then chunk order.
    #[serde(skip)]
    pub documents: Vec<Document>,
}

impl IngestResult {
    fn skip(&mut self, path: String, reason: SkipReason) {
        self.files_skipped += 1;
        match reason {
            SkipReason::UnsupportedExtension | SkipReason::UnsupportedLanguage => {
                self.skipped_unsupported += 1;
            }
            SkipReason::TooLarge => self.skipped_too_large += 1,
            SkipReason::NonUtf8 => self.skipped_non_utf8 += 1,
            SkipReason::IoError => self.skipped_io_error += 1,
            SkipReason::ParseError => self.skipped_parse_error += 1,
        }
        self.skipped_files.push(SkippedFile { path, reason });
    }
}

/// Map a per-file load failure to the reason it is reported under.
fn skip_reason(err: &DocsplitError) -> SkipReason {
    match err {
        DocsplitError::NonUtf8 { .. } => SkipReason::NonUtf8,
        DocsplitError::UnsupportedLanguage { .. } => SkipReason::UnsupportedLanguage,
        DocsplitError::Parse { .. } => SkipReason::ParseError,
        _ => SkipReason::IoError,
    }
}

/// Scan the project root and load every supported file into documents.
///
/// Files are loaded in parallel; each file gets its own parser and chunk
/// accumulator. Per-file failures are recorded as skips, not returned.
pub fn run_ingest(config: &Config) -> Result<IngestResult> {
    let loader = Loader::from_config(config)?;
    let scanner = Scanner::with_max_file_size(
        &config.project_root,
        config.settings.indexing.max_file_size_mb,
    )
    .with_excludes(&config.settings.indexing.exclude_patterns);

    let scanned = scanner.scan(|ext| loader.supports_extension(ext))?;
    let mut result = IngestResult {
        files_scanned: scanned.files.len() + scanned.skipped.len(),
        ..Default::default()
    };
    for (path, reason) in scanned.skipped {
        result.skip(path, reason);
    }

    let loaded: Vec<_> = scanned
        .files
        .par_iter()
        .map(|file| {
            let outcome = loader.load_file(&file.path, &file.relative_path, None);
            (file.relative_path.clone(), outcome)
        })
        .collect();

    for (path, outcome) in loaded {
        match outcome {
            Ok(docs) => {
                result.files_loaded += 1;
                result.chunks_created += docs.len();
                result.documents.extend(docs);
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "skipping file");
                result.skip(path, skip_reason(&e));
            }
        }
    }

    tracing::info!(
        files_loaded = result.files_loaded,
        files_skipped = result.files_skipped,
        chunks = result.chunks_created,
        "ingest finished"
    );
    Ok(result)
}
