//! Parse adapter: source text + grammar → top-level syntactic units.

use serde::Serialize;
use tree_sitter::{Node, Parser, TreeCursor};

use crate::error::{DocsplitError, Result};
use crate::ingest::grammar::Grammar;

/// One top-level child of a document's root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntacticUnit {
    /// Literal source text spanned by the node.
    pub text: String,
    /// Node kind as reported by the grammar.
    pub kind: String,
    /// Start line (1-based).
    pub start_line: u32,
    /// End line (1-based, inclusive).
    pub end_line: u32,
}

impl SyntacticUnit {
    /// Build a unit from bare text, for callers that have no parse tree.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let end_line = text.lines().count().max(1) as u32;
        Self {
            text,
            kind: "text".into(),
            start_line: 1,
            end_line,
        }
    }
}

/// Indicates the completeness of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseQuality {
    /// Parsed without any syntax errors.
    Complete,
    /// Parsed, but the tree contains ERROR or MISSING nodes.
    Partial {
        /// Number of distinct lines carrying errors.
        error_count: usize,
        /// Lines where errors were detected (1-based).
        error_lines: Vec<u32>,
    },
}

impl ParseQuality {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Units extracted from one source file plus the quality of the parse.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub units: Vec<SyntacticUnit>,
    pub quality: ParseQuality,
}

/// Parse `source` with `grammar` and return the root's immediate children.
///
/// Deeper structure is not used: every top-level child is one unit.
pub fn parse_units(source: &str, grammar: &Grammar) -> Result<ParsedSource> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar.language())
        .map_err(|e| DocsplitError::Parse {
            path: String::new(),
            detail: format!("failed to set {} language: {e}", grammar.id()),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| DocsplitError::Parse {
            path: String::new(),
            detail: format!("tree-sitter produced no tree for {}", grammar.id()),
        })?;

    let root = tree.root_node();
    let source_bytes = source.as_bytes();

    let mut cursor = root.walk();
    let units = root
        .children(&mut cursor)
        .filter_map(|child| unit_from_node(child, source_bytes))
        .collect();

    let quality = if root.has_error() {
        let error_lines = find_error_lines(root);
        ParseQuality::Partial {
            error_count: error_lines.len(),
            error_lines,
        }
    } else {
        ParseQuality::Complete
    };

    Ok(ParsedSource { units, quality })
}

fn unit_from_node(node: Node, source: &[u8]) -> Option<SyntacticUnit> {
    let text = node.utf8_text(source).ok()?;
    if text.is_empty() {
        return None;
    }
    Some(SyntacticUnit {
        text: text.to_string(),
        kind: node.kind().to_string(),
        start_line: node.start_position().row as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
    })
}

/// Returns 1-based line numbers of all ERROR and MISSING nodes.
#[must_use]
pub fn find_error_lines(root: Node) -> Vec<u32> {
    let mut errors = Vec::new();
    let mut cursor = root.walk();

    fn visit(cursor: &mut TreeCursor, errors: &mut Vec<u32>) {
        loop {
            let node = cursor.node();
            if node.is_error() || node.is_missing() {
                let line = node.start_position().row as u32 + 1;
                if !errors.contains(&line) {
                    errors.push(line);
                }
            }
            if cursor.goto_first_child() {
                visit(cursor, errors);
                cursor.goto_parent();
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    visit(&mut cursor, &mut errors);
    errors.sort_unstable();
    errors
}
