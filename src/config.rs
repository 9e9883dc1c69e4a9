use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsplitError, Result};
use crate::ingest::chunker::Budget;
use crate::ingest::grammar::DEFAULT_LANGUAGE;
use crate::ingest::text::splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::models::tokens::{max_tokens_for, DEFAULT_MODEL};

/// Directory holding project-level docsplit settings.
const DOCSPLIT_DIR: &str = ".docsplit";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";

/// Project-level configuration resolved from a root directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the project being chunked.
    pub project_root: PathBuf,
    /// Path to the `.docsplit/` directory.
    pub docsplit_dir: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// User settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .docsplit/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Code chunking configuration.
    pub chunking: ChunkingSettings,
    /// Prose splitting configuration.
    pub text: TextSettings,
    /// File discovery configuration.
    pub indexing: IndexingSettings,
    /// Custom language mappings.
    pub languages: LanguageSettings,
}

/// Settings for the syntax-aware code chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Embedding model whose input limit sets the token budget.
    pub model: String,
    /// Explicit token budget; overrides the model lookup when set.
    pub max_tokens: Option<i64>,
    /// Token counter: "estimate" (~4 bytes per token) or "chars".
    pub counter: String,
    /// Slice policy for oversized units: "chars" or "tokens".
    pub slicer: String,
    /// Language used when a file's language has no grammar.
    /// Empty string rejects such files instead.
    pub default_language: String,
    /// Fail on source with syntax errors instead of chunking what parsed.
    pub strict_parse: bool,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_tokens: None,
            counter: "estimate".into(),
            slicer: "chars".into(),
            default_language: DEFAULT_LANGUAGE.into(),
            strict_parse: false,
        }
    }
}

/// Settings for the recursive text splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters repeated between neighbouring windows.
    pub chunk_overlap: usize,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// File discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Patterns to exclude (matched as path substrings).
    pub exclude_patterns: Vec<String>,
    /// Maximum file size in MB (files larger are skipped).
    pub max_file_size_mb: u32,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![
                "node_modules/".into(),
                ".git/".into(),
                "target/".into(),
                "dist/".into(),
                "__pycache__/".into(),
                ".venv/".into(),
                "vendor/".into(),
            ],
            max_file_size_mb: 10,
        }
    }
}

/// Custom language mapping settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    /// Extension (without dot) to language id, e.g. {"jsx" = "js"}.
    pub custom_mappings: HashMap<String, String>,
}

impl Config {
    /// Create config for a given project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let docsplit_dir = project_root.join(DOCSPLIT_DIR);
        let config_path = docsplit_dir.join(CONFIG_FILE);

        let settings = Self::load_settings(&config_path).unwrap_or_default();

        Self {
            project_root,
            docsplit_dir,
            config_path,
            settings,
        }
    }

    /// Create config from the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| DocsplitError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd))
    }

    /// Load settings from config.toml if it exists.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        match toml::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    /// Save current settings to config.toml.
    pub fn save_settings(&self) -> Result<()> {
        std::fs::create_dir_all(&self.docsplit_dir)?;
        let content = toml::to_string_pretty(&self.settings)
            .map_err(|e| DocsplitError::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Token budget for code chunks: explicit `max_tokens`, else the model's limit.
    pub fn budget(&self) -> Result<Budget> {
        let chunking = &self.settings.chunking;
        let tokens = chunking
            .max_tokens
            .unwrap_or_else(|| i64::try_from(max_tokens_for(&chunking.model)).unwrap_or(i64::MAX));
        Budget::new(tokens)
    }
}
