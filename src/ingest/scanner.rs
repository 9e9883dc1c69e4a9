use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;

/// Reason why a file was skipped during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// File extension is not handled by any loader.
    UnsupportedExtension,
    /// File exceeds the configured `max_file_size_mb` limit.
    TooLarge,
    /// File content is not valid UTF-8.
    NonUtf8,
    /// IO error while reading the file.
    IoError,
    /// No grammar for the file's language and no default configured.
    UnsupportedLanguage,
    /// Source or PDF could not be parsed.
    ParseError,
}

/// Discovered file ready to be loaded.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the scan root, with `/` separators.
    pub relative_path: String,
}

/// Outcome of a scan: files to load plus files rejected up front.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Parallel file scanner that respects .gitignore.
pub struct Scanner {
    root: PathBuf,
    /// Maximum file size in bytes (0 = unlimited).
    max_file_size_bytes: u64,
    /// Path substrings to leave out.
    exclude_patterns: Vec<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size_bytes: 0,
            exclude_patterns: Vec::new(),
        }
    }

    /// Create a scanner with a file size limit.
    pub fn with_max_file_size(root: impl Into<PathBuf>, max_size_mb: u32) -> Self {
        Self {
            max_file_size_bytes: u64::from(max_size_mb) * 1024 * 1024,
            ..Self::new(root)
        }
    }

    #[must_use]
    pub fn with_excludes(mut self, patterns: &[String]) -> Self {
        self.exclude_patterns = patterns
            .iter()
            .map(|p| p.trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Scan the root in parallel. `is_supported` decides, per lowercase
    /// extension, whether a file has a loader.
    pub fn scan<F>(&self, is_supported: F) -> Result<ScanResult>
    where
        F: Fn(&str) -> bool + Sync,
    {
        let entries: Vec<PathBuf> = WalkBuilder::new(&self.root)
            .hidden(true) // skip hidden dirs like .git
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false) // Prevent symlink loops
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !matches!(
                    name.as_ref(),
                    "node_modules"
                        | "target"
                        | ".docsplit"
                        | ".git"
                        | "vendor"
                        | "dist"
                        | "build"
                        | "__pycache__"
                        | ".venv"
                        | "venv"
                )
            })
            .build()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|p| !self.is_excluded(p))
            .collect();

        let root = &self.root;
        let max_size = self.max_file_size_bytes;
        let outcomes: Vec<std::result::Result<ScannedFile, (String, SkipReason)>> = entries
            .par_iter()
            .map(|path| {
                let relative = path
                    .strip_prefix(root)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/");
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();

                if !is_supported(&ext) {
                    return Err((relative, SkipReason::UnsupportedExtension));
                }
                let Ok(meta) = path.metadata() else {
                    return Err((relative, SkipReason::IoError));
                };
                if max_size > 0 && meta.len() > max_size {
                    return Err((relative, SkipReason::TooLarge));
                }

                Ok(ScannedFile {
                    path: path.clone(),
                    relative_path: relative,
                })
            })
            .collect();

        let mut result = ScanResult::default();
        for outcome in outcomes {
            match outcome {
                Ok(file) => result.files.push(file),
                Err(skip) => result.skipped.push(skip),
            }
        }
        result
            .files
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        result.skipped.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(result)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative.to_string_lossy();
        self.exclude_patterns
            .iter()
            .any(|pattern| path_str.contains(pattern.as_str()))
    }
}

/// Map a file extension (without dot) to a grammar language id.
///
/// Grammar ids that double as extensions map to themselves. The remaining
/// entries are aliases for extensions that differ from their language id.
#[must_use]
pub fn ext_to_language(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_lowercase().as_str() {
        "js" | "jsx" | "mjs" | "cjs" => "js",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "h" => "cpp",
        "go" => "go",
        "java" => "java",
        "php" => "php",
        "py" | "pyi" | "python" => "python",
        "rb" | "ruby" => "ruby",
        "rs" | "rust" => "rust",
        "scala" | "sc" => "scala",
        "md" => "md",
        "markdown" => "markdown",
        "html" | "htm" => "html",
        "sol" => "sol",
        "kt" | "kts" | "kotlin" => "kotlin",
        _ => return None,
    };
    Some(lang)
}

/// Extensions handled by the prose splitter.
#[must_use]
pub fn is_text_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "txt" | "text" | "rst" | "adoc" | "org" | "log"
    )
}
