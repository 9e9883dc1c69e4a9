//! Turns files into `Document`s: code through the bounded chunker, prose and
//! PDF text through the recursive splitter.

use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::error::{DocsplitError, Result};
use crate::ingest::chunker::{slicer_by_name, BoundedChunker};
use crate::ingest::grammar::{self, Grammar, DEFAULT_LANGUAGE};
use crate::ingest::parse::{parse_units, ParseQuality};
use crate::ingest::scanner::{ext_to_language, is_text_extension};
use crate::ingest::text::{PdfExtractor, RecursiveSplitter, TextSplitter};
use crate::models::document::{content_hash, DocKind, Document, DocumentMetadata};
use crate::models::tokens::counter_by_name;

/// Routes files to the code chunker or the text splitter.
pub struct Loader {
    chunker: BoundedChunker,
    splitter: RecursiveSplitter,
    pdf: PdfExtractor,
    default_language: String,
    strict_parse: bool,
    custom_mappings: HashMap<String, String>,
}

impl Loader {
    #[must_use]
    pub fn new(chunker: BoundedChunker, splitter: RecursiveSplitter) -> Self {
        Self {
            chunker,
            splitter,
            pdf: PdfExtractor::new(),
            default_language: DEFAULT_LANGUAGE.into(),
            strict_parse: false,
            custom_mappings: HashMap::new(),
        }
    }

    /// Build a loader from project settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let chunking = &config.settings.chunking;
        let counter = counter_by_name(&chunking.counter).ok_or_else(|| {
            DocsplitError::Config(format!("unknown token counter: {}", chunking.counter))
        })?;
        let slicer = slicer_by_name(&chunking.slicer).ok_or_else(|| {
            DocsplitError::Config(format!("unknown slicer: {}", chunking.slicer))
        })?;
        let chunker = BoundedChunker::new(config.budget()?)
            .with_counter(counter)
            .with_slicer(slicer);
        let splitter = RecursiveSplitter::new(
            config.settings.text.chunk_size,
            config.settings.text.chunk_overlap,
        )?;

        Ok(Self::new(chunker, splitter)
            .with_default_language(&chunking.default_language)
            .with_strict_parse(chunking.strict_parse)
            .with_custom_mappings(config.settings.languages.custom_mappings.clone()))
    }

    /// Language used when no grammar matches. Empty disables the fallback.
    #[must_use]
    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = language.to_string();
        self
    }

    #[must_use]
    pub fn with_strict_parse(mut self, strict: bool) -> Self {
        self.strict_parse = strict;
        self
    }

    #[must_use]
    pub fn with_custom_mappings(mut self, mappings: HashMap<String, String>) -> Self {
        self.custom_mappings = mappings
            .into_iter()
            .map(|(ext, lang)| (ext.trim_start_matches('.').to_lowercase(), lang))
            .collect();
        self
    }

    #[must_use]
    pub fn chunker(&self) -> &BoundedChunker {
        &self.chunker
    }

    /// Language id for an extension: custom mappings first, then built-ins.
    #[must_use]
    pub fn language_for_extension(&self, ext: &str) -> Option<String> {
        let ext = ext.to_lowercase();
        self.custom_mappings
            .get(&ext)
            .cloned()
            .or_else(|| ext_to_language(&ext).map(str::to_string))
    }

    /// Whether any loader handles files with this extension.
    ///
    /// The default language is not consulted: directory ingestion only picks
    /// up files with a known language, while explicit loads fall back.
    #[must_use]
    pub fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("pdf")
            || is_text_extension(ext)
            || self.language_for_extension(ext).is_some()
    }

    /// Split source code into chunk strings with `grammar`.
    ///
    /// `source` names the file in errors and logs.
    pub fn chunk_code(&self, code: &str, grammar: &Grammar, source: &str) -> Result<Vec<String>> {
        let parsed = parse_units(code, grammar).map_err(|e| match e {
            DocsplitError::Parse { detail, .. } => DocsplitError::Parse {
                path: source.into(),
                detail,
            },
            other => other,
        })?;

        if let ParseQuality::Partial {
            error_count,
            error_lines,
        } = &parsed.quality
        {
            if self.strict_parse {
                return Err(DocsplitError::Parse {
                    path: source.into(),
                    detail: format!("{error_count} syntax error line(s): {error_lines:?}"),
                });
            }
            tracing::warn!(
                source,
                language = grammar.id(),
                error_count,
                ?error_lines,
                "source has syntax errors, chunking what parsed"
            );
        }

        let chunks = self.chunker.chunk(&parsed.units);
        tracing::debug!(
            source,
            language = grammar.id(),
            units = parsed.units.len(),
            chunks = chunks.len(),
            budget = %self.chunker.budget(),
            "chunked code"
        );
        Ok(chunks)
    }

    /// Chunk a source file into documents.
    ///
    /// The language is `language` if given, else derived from the extension of
    /// `source`, else the extension itself. Unresolved languages use the
    /// default language when one is configured.
    pub fn code_docs(
        &self,
        code: &str,
        source: &str,
        language: Option<&str>,
    ) -> Result<Vec<Document>> {
        let ext = extension_of(source);
        let language = language
            .map(str::to_string)
            .or_else(|| self.language_for_extension(&ext))
            .unwrap_or(ext);

        let grammar = grammar::resolve_or(&language, &self.default_language).ok_or_else(|| {
            DocsplitError::UnsupportedLanguage {
                lang: language.clone(),
            }
        })?;
        if grammar::resolve(&language).is_none() {
            tracing::debug!(
                source,
                language = %language,
                fallback = grammar.id(),
                "no grammar for language, using default"
            );
        }

        let chunks = self.chunk_code(code, &grammar, source)?;
        let metadata = DocumentMetadata::new(source, DocKind::Code).with_language(grammar.id());
        Ok(Document::wrap_all(chunks, &metadata, 0))
    }

    /// Split prose into documents.
    #[must_use]
    pub fn text_docs(&self, text: &str, source: &str) -> Vec<Document> {
        let chunks = self.splitter.split_text(text);
        tracing::debug!(source, chunks = chunks.len(), "split text");
        Document::wrap_all(chunks, &DocumentMetadata::new(source, DocKind::Text), 0)
    }

    /// Extract a PDF and split each page into documents.
    pub fn pdf_docs(&self, bytes: &[u8], source: &str) -> Result<Vec<Document>> {
        let pages = self.pdf.extract_from_bytes(bytes, source)?;
        let mut docs = Vec::new();
        for page in pages {
            let chunks = self.splitter.split_text(&page.text);
            let metadata = DocumentMetadata::new(source, DocKind::Pdf).with_page(page.number);
            let first_index = docs.len();
            docs.extend(Document::wrap_all(chunks, &metadata, first_index));
        }
        tracing::debug!(source, chunks = docs.len(), "split pdf");
        Ok(docs)
    }

    /// Load a file from disk, routing it by extension.
    ///
    /// `source` is recorded in the documents' metadata together with the
    /// file's content hash. An explicit `language` forces the code path.
    pub fn load_file(
        &self,
        path: &Path,
        source: &str,
        language: Option<&str>,
    ) -> Result<Vec<Document>> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocsplitError::FileNotFound {
                path: source.into(),
            },
            _ => DocsplitError::Io(e),
        })?;
        let hash = content_hash(&bytes);
        let ext = extension_of(source);

        let mut docs = if language.is_none() && ext == "pdf" {
            self.pdf_docs(&bytes, source)?
        } else {
            let text = String::from_utf8(bytes).map_err(|_| DocsplitError::NonUtf8 {
                path: source.into(),
            })?;
            if language.is_none() && is_text_extension(&ext) {
                self.text_docs(&text, source)
            } else {
                self.code_docs(&text, source, language)?
            }
        };

        for doc in &mut docs {
            doc.metadata.content_hash = Some(hash.clone());
        }
        Ok(docs)
    }
}

fn extension_of(source: &str) -> String {
    Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::chunker::Budget;
    use crate::models::tokens::CharCounter;
    use std::fs;
    use tempfile::TempDir;

    fn loader(budget: i64) -> Loader {
        let chunker =
            BoundedChunker::new(Budget::new(budget).unwrap()).with_counter(Box::new(CharCounter));
        Loader::new(chunker, RecursiveSplitter::default())
    }

    const RUST_SOURCE: &str = "fn one() -> u32 {\n    1\n}\n\nfn two() -> u32 {\n    2\n}\n";

    #[test]
    fn code_docs_carry_source_and_order() {
        // Each function is 25 chars, so two do not fit a budget of 30.
        let docs = loader(30).code_docs(RUST_SOURCE, "src/lib.rs", None).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].page_content, "\nfn one() -> u32 {\n    1\n}");
        assert_eq!(docs[1].metadata.index, 1);
        assert_eq!(docs[1].metadata.source, "src/lib.rs");
        assert_eq!(docs[1].metadata.kind, DocKind::Code);
        assert_eq!(docs[1].metadata.language.as_deref(), Some("rust"));
    }

    #[test]
    fn items_share_a_chunk_when_they_fit() {
        let docs = loader(100).code_docs(RUST_SOURCE, "src/lib.rs", None).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].page_content.contains("fn one"));
        assert!(docs[0].page_content.contains("fn two"));
    }

    #[test]
    fn explicit_language_wins_over_extension() {
        let docs = loader(100)
            .code_docs("def f():\n    return 1\n", "snippet.txt", Some("python"))
            .unwrap();
        assert_eq!(docs[0].metadata.language.as_deref(), Some("python"));
    }

    #[test]
    fn unknown_language_uses_default_grammar() {
        let docs = loader(100)
            .code_docs("let x = 1;", "script.weird", None)
            .unwrap();
        assert_eq!(docs[0].metadata.language.as_deref(), Some("js"));
    }

    #[test]
    fn unknown_language_without_default_is_rejected() {
        let err = loader(100)
            .with_default_language("")
            .code_docs("let x = 1;", "script.weird", None)
            .unwrap_err();
        assert!(matches!(err, DocsplitError::UnsupportedLanguage { lang } if lang == "weird"));
    }

    #[test]
    fn strict_parse_rejects_syntax_errors() {
        let err = loader(100)
            .with_strict_parse(true)
            .code_docs("fn broken( {", "bad.rs", None)
            .unwrap_err();
        assert!(matches!(err, DocsplitError::Parse { path, .. } if path == "bad.rs"));
    }

    #[test]
    fn lenient_parse_still_chunks_broken_source() {
        let docs = loader(100).code_docs("fn broken( {", "bad.rs", None).unwrap();
        assert!(!docs.is_empty());
    }

    #[test]
    fn empty_source_yields_no_documents() {
        assert!(loader(100).code_docs("", "empty.go", None).unwrap().is_empty());
    }

    #[test]
    fn custom_mappings_extend_extensions() {
        let mut mappings = HashMap::new();
        mappings.insert(".ES6".to_string(), "js".to_string());
        let l = loader(100).with_custom_mappings(mappings);
        assert_eq!(l.language_for_extension("es6").as_deref(), Some("js"));
        assert!(l.supports_extension("es6"));
        assert!(l.supports_extension("pdf"));
        assert!(l.supports_extension("txt"));
        assert!(!l.supports_extension("png"));
    }

    #[test]
    fn text_docs_use_the_splitter() {
        let docs = loader(100).text_docs("Just a note.", "notes.txt");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "Just a note.");
        assert_eq!(docs[0].metadata.kind, DocKind::Text);
        assert!(docs[0].metadata.language.is_none());
    }

    #[test]
    fn load_file_routes_by_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "plain words").unwrap();
        fs::write(tmp.path().join("b.py"), "x = 1\n").unwrap();

        let l = loader(100);
        let text = l.load_file(&tmp.path().join("a.txt"), "a.txt", None).unwrap();
        assert_eq!(text[0].metadata.kind, DocKind::Text);

        let code = l.load_file(&tmp.path().join("b.py"), "b.py", None).unwrap();
        assert_eq!(code[0].metadata.language.as_deref(), Some("python"));
        assert_eq!(code[0].page_content, "\nx = 1");
    }

    #[test]
    fn load_file_stamps_every_chunk_with_the_file_hash() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("lib.rs"), RUST_SOURCE).unwrap();
        fs::write(tmp.path().join("copy.rs"), RUST_SOURCE).unwrap();
        fs::write(tmp.path().join("a.txt"), "plain words").unwrap();

        let l = loader(30);
        let docs = l.load_file(&tmp.path().join("lib.rs"), "lib.rs", None).unwrap();
        assert!(docs.len() > 1);
        let expected = content_hash(RUST_SOURCE.as_bytes());
        assert!(docs
            .iter()
            .all(|d| d.metadata.content_hash.as_deref() == Some(expected.as_str())));

        let copy = l.load_file(&tmp.path().join("copy.rs"), "copy.rs", None).unwrap();
        assert_eq!(copy[0].metadata.content_hash, docs[0].metadata.content_hash);

        let text = l.load_file(&tmp.path().join("a.txt"), "a.txt", None).unwrap();
        assert_ne!(text[0].metadata.content_hash, docs[0].metadata.content_hash);
    }

    #[test]
    fn load_file_reports_missing_and_binary_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bin.rs"), [0xff, 0xfe, 0x00]).unwrap();

        let l = loader(100);
        let missing = l.load_file(&tmp.path().join("nope.rs"), "nope.rs", None);
        assert!(matches!(missing, Err(DocsplitError::FileNotFound { .. })));

        let binary = l.load_file(&tmp.path().join("bin.rs"), "bin.rs", None);
        assert!(matches!(binary, Err(DocsplitError::NonUtf8 { .. })));
    }

    #[test]
    fn from_config_rejects_unknown_counter() {
        let mut cfg = Config::new("/tmp/project");
        cfg.settings.chunking.counter = "bpe".into();
        assert!(matches!(Loader::from_config(&cfg), Err(DocsplitError::Config(_))));
    }

    #[test]
    fn from_config_uses_configured_budget() {
        let mut cfg = Config::new("/tmp/project");
        cfg.settings.chunking.max_tokens = Some(42);
        let l = Loader::from_config(&cfg).unwrap();
        assert_eq!(l.chunker().budget().get(), 42);
    }
}
