//! Static language-id → grammar table.
//!
//! Grammars come from the published tree-sitter grammar crates. The table is
//! built once per process and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use tree_sitter::Language;

/// Language used when a caller has no better match.
pub const DEFAULT_LANGUAGE: &str = "js";

/// An opaque parsing capability for one language.
#[derive(Clone)]
pub struct Grammar {
    id: &'static str,
    language: Language,
}

impl Grammar {
    fn new(id: &'static str, language: impl Into<Language>) -> Self {
        Self {
            id,
            language: language.into(),
        }
    }

    /// Canonical id of the grammar (`md` and `markdown` share `markdown`).
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub(crate) fn language(&self) -> &Language {
        &self.language
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar").field("id", &self.id).finish()
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

static GRAMMARS: LazyLock<HashMap<&'static str, Grammar>> = LazyLock::new(|| {
    let markdown = Grammar::new("markdown", tree_sitter_md::LANGUAGE);
    HashMap::from([
        ("js", Grammar::new("js", tree_sitter_javascript::LANGUAGE)),
        ("cpp", Grammar::new("cpp", tree_sitter_cpp::LANGUAGE)),
        ("go", Grammar::new("go", tree_sitter_go::LANGUAGE)),
        ("java", Grammar::new("java", tree_sitter_java::LANGUAGE)),
        ("php", Grammar::new("php", tree_sitter_php::LANGUAGE_PHP)),
        ("python", Grammar::new("python", tree_sitter_python::LANGUAGE)),
        ("ruby", Grammar::new("ruby", tree_sitter_ruby::LANGUAGE)),
        ("rust", Grammar::new("rust", tree_sitter_rust::LANGUAGE)),
        ("scala", Grammar::new("scala", tree_sitter_scala::LANGUAGE)),
        ("md", markdown.clone()),
        ("markdown", markdown),
        ("html", Grammar::new("html", tree_sitter_html::LANGUAGE)),
        ("sol", Grammar::new("sol", tree_sitter_solidity::LANGUAGE)),
        ("kotlin", Grammar::new("kotlin", tree_sitter_kotlin_ng::LANGUAGE)),
    ])
});

/// Resolve a language id (exact, case-sensitive) to its grammar.
#[must_use]
pub fn resolve(language_id: &str) -> Option<Grammar> {
    GRAMMARS.get(language_id).cloned()
}

/// Resolve a language id, falling back to `default` when it is unknown.
///
/// An empty `default` disables the fallback.
#[must_use]
pub fn resolve_or(language_id: &str, default: &str) -> Option<Grammar> {
    resolve(language_id).or_else(|| {
        if default.is_empty() {
            None
        } else {
            resolve(default)
        }
    })
}

/// All recognized language ids, sorted.
#[must_use]
pub fn supported_languages() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = GRAMMARS.keys().copied().collect();
    ids.sort_unstable();
    ids
}
