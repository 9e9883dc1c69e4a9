//! Greedy token-bounded packing of syntactic units into chunks.
//!
//! Units are appended to the current chunk, each preceded by `'\n'`, while the
//! token budget allows. A unit that does not fit into a non-empty chunk starts
//! a new one. A unit that does not fit into an empty chunk is sliced, and the
//! slices spill over into as many chunks as needed.

use std::fmt;

use crate::error::{DocsplitError, Result};
use crate::ingest::parse::SyntacticUnit;
use crate::models::tokens::{EstimateCounter, TokenCounter};

/// Maximum number of tokens per chunk. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget(usize);

impl Budget {
    /// Validate a configured budget. Zero and negative values are rejected.
    pub fn new(tokens: i64) -> Result<Self> {
        if tokens <= 0 {
            return Err(DocsplitError::InvalidBudget { budget: tokens });
        }
        usize::try_from(tokens)
            .map(Self)
            .map_err(|_| DocsplitError::InvalidBudget { budget: tokens })
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decides how much of a unit to take when it is appended.
pub trait SliceStrategy: Send + Sync {
    /// Number of leading characters of `text` to take, given `remaining`
    /// tokens of room in the current chunk.
    fn slice_chars(&self, text: &str, remaining: usize, counter: &dyn TokenCounter) -> usize;
}

/// Uses the remaining token room directly as a character count.
///
/// This is an approximation: the slice is re-measured after it is taken, and
/// its real token count can differ from its character length.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharBudget;

impl SliceStrategy for CharBudget {
    fn slice_chars(&self, text: &str, remaining: usize, _counter: &dyn TokenCounter) -> usize {
        text.chars().take(remaining).count()
    }
}

/// Takes the longest character prefix whose token count fits the remaining
/// room, found by binary search over prefix lengths.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBoundary;

impl SliceStrategy for TokenBoundary {
    fn slice_chars(&self, text: &str, remaining: usize, counter: &dyn TokenCounter) -> usize {
        let total = text.chars().count();
        if counter.count(text) <= remaining {
            return total;
        }
        let (mut lo, mut hi) = (0, total);
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            if counter.count(char_prefix(text, mid)) <= remaining {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }
}

/// Build a slice strategy from its configured name ("chars" or "tokens").
#[must_use]
pub fn slicer_by_name(name: &str) -> Option<Box<dyn SliceStrategy>> {
    match name {
        "chars" => Some(Box::new(CharBudget)),
        "tokens" => Some(Box::new(TokenBoundary)),
        _ => None,
    }
}

/// Packs units into chunks of at most `budget` tokens.
pub struct BoundedChunker {
    budget: Budget,
    counter: Box<dyn TokenCounter>,
    slicer: Box<dyn SliceStrategy>,
}

impl BoundedChunker {
    /// Chunker with the estimating counter and character-budget slicing.
    #[must_use]
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            counter: Box::new(EstimateCounter),
            slicer: Box::new(CharBudget),
        }
    }

    #[must_use]
    pub fn with_counter(mut self, counter: Box<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    #[must_use]
    pub fn with_slicer(mut self, slicer: Box<dyn SliceStrategy>) -> Self {
        self.slicer = slicer;
        self
    }

    #[must_use]
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Partition `units` into ordered, non-empty chunks.
    #[must_use]
    pub fn chunk(&self, units: &[SyntacticUnit]) -> Vec<String> {
        let budget = self.budget.get();
        let counter = self.counter.as_ref();
        let mut chunks = Vec::new();
        let mut fragment = String::new();
        let mut fragment_tokens = 0usize;

        for unit in units {
            let mut rest = unit.text.as_str();
            while !rest.is_empty() {
                let fits =
                    fragment.is_empty() || fragment_tokens + counter.count(rest) <= budget;
                let take = if fits {
                    let remaining = budget.saturating_sub(fragment_tokens);
                    self.slicer.slice_chars(rest, remaining, counter)
                } else {
                    0
                };

                // Nothing can be taken into a non-empty chunk: close it and
                // retry the same text against an empty one.
                if take == 0 && !fragment.is_empty() {
                    chunks.push(std::mem::take(&mut fragment));
                    fragment_tokens = 0;
                    continue;
                }

                let (slice, tail) = rest.split_at(char_offset(rest, take.max(1)));
                fragment.push('\n');
                fragment.push_str(slice);
                fragment_tokens += counter.count(slice);
                rest = tail;
            }
        }

        if !fragment.is_empty() {
            chunks.push(fragment);
        }
        chunks
    }
}

/// Byte offset of the `n`th character, or the end of `text`.
fn char_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

fn char_prefix(text: &str, n: usize) -> &str {
    &text[..char_offset(text, n)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::grammar;
    use crate::ingest::parse::parse_units;
    use crate::models::tokens::CharCounter;

    const RUST_SOURCE: &str = r#"use std::fmt;

/// Point in 2D.
struct Point {
    x: i32,
    y: i32,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn origin() -> Point {
    Point { x: 0, y: 0 }
}
"#;

    fn rust_units() -> Vec<SyntacticUnit> {
        let rust = grammar::resolve("rust").unwrap();
        parse_units(RUST_SOURCE, &rust).unwrap().units
    }

    fn units(texts: &[&str]) -> Vec<SyntacticUnit> {
        texts.iter().map(|t| SyntacticUnit::from_text(*t)).collect()
    }

    fn char_chunker(budget: i64) -> BoundedChunker {
        BoundedChunker::new(Budget::new(budget).unwrap()).with_counter(Box::new(CharCounter))
    }

    /// Remove the separator inserted before every slice.
    fn strip_separators(chunks: &[String]) -> String {
        chunks.concat().replace('\n', "")
    }

    #[test]
    fn single_small_unit() {
        let chunks = char_chunker(100).chunk(&units(&["a"]));
        assert_eq!(chunks, vec!["\na".to_string()]);
    }

    #[test]
    fn units_that_overflow_together_are_split_at_the_boundary() {
        let x = "x".repeat(50);
        let y = "y".repeat(50);
        let chunks = char_chunker(60).chunk(&units(&[x.as_str(), y.as_str()]));
        assert_eq!(chunks, vec![format!("\n{x}"), format!("\n{y}")]);
    }

    #[test]
    fn units_that_fit_together_share_a_chunk() {
        let x = "x".repeat(20);
        let y = "y".repeat(30);
        let chunks = char_chunker(60).chunk(&units(&[x.as_str(), y.as_str()]));
        assert_eq!(chunks, vec![format!("\n{x}\n{y}")]);
    }

    #[test]
    fn no_units_no_chunks() {
        assert!(char_chunker(100).chunk(&[]).is_empty());
    }

    #[test]
    fn oversized_unit_is_sliced_across_chunks() {
        let z = "z".repeat(250);
        let chunks = char_chunker(100).chunk(&units(&[z.as_str()]));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 101);
        assert_eq!(chunks[1].len(), 101);
        assert_eq!(chunks[2].len(), 51);
        assert_eq!(strip_separators(&chunks), z);
    }

    #[test]
    fn tail_of_oversized_unit_packs_with_next_unit() {
        let z = "z".repeat(130);
        let chunks = char_chunker(100).chunk(&units(&[z.as_str(), "abc"]));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], format!("\n{}\nabc", "z".repeat(30)));
    }

    #[test]
    fn huge_unit_terminates() {
        let big = "q".repeat(10_000);
        let chunks = char_chunker(7).chunk(&units(&[big.as_str()]));
        assert_eq!(chunks.len(), 10_000usize.div_ceil(7));
        assert_eq!(strip_separators(&chunks), big);
    }

    #[test]
    fn completeness_and_non_emptiness() {
        let texts = ["fn a() {}", "struct B { x: u32 }", "impl B { fn c(&self) {} }", "// end"];
        let chunks = char_chunker(25).chunk(&units(&texts));
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(strip_separators(&chunks), texts.concat());
    }

    #[test]
    fn multi_line_units_keep_their_newlines() {
        let units = rust_units();
        assert!(units.iter().any(|u| u.text.contains('\n')));

        // Budget of the longest unit: nothing is sliced, so the output is
        // exactly one separator per unit followed by the unit's own text.
        let longest = units.iter().map(|u| u.text.chars().count()).max().unwrap();
        let chunks = char_chunker(longest as i64).chunk(&units);
        assert!(chunks.len() > 1);
        let expected: String = units.iter().map(|u| format!("\n{}", u.text)).collect();
        assert_eq!(chunks.concat(), expected);
    }

    #[test]
    fn sliced_multi_line_unit_loses_only_separators() {
        let units = rust_units();
        let display_impl = units
            .iter()
            .find(|u| u.text.starts_with("impl fmt::Display"))
            .unwrap();

        // A lone unit larger than the budget fills each chunk with exactly one
        // slice, so dropping the leading separator of every chunk restores it.
        let chunks = char_chunker(16).chunk(std::slice::from_ref(display_impl));
        assert!(chunks.len() > 1);
        let restored: String = chunks
            .iter()
            .map(|c| c.strip_prefix('\n').unwrap())
            .collect();
        assert_eq!(restored, display_impl.text);
    }

    #[test]
    fn budget_is_respected_by_units_that_fit() {
        let texts = ["aaaa", "bbbbbb", "cc", "dddddddd", "e"];
        let chunks = char_chunker(10).chunk(&units(&texts));
        for chunk in &chunks {
            assert!(chunk.replace('\n', "").chars().count() <= 10, "{chunk:?}");
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let texts = ["alpha", "beta gamma", "delta epsilon zeta", "eta"];
        let chunker = char_chunker(12);
        assert_eq!(chunker.chunk(&units(&texts)), chunker.chunk(&units(&texts)));
    }

    #[test]
    fn multibyte_text_is_sliced_on_char_boundaries() {
        let text = "héllo wörld ünïcode";
        let chunks = char_chunker(4).chunk(&units(&[text]));
        assert_eq!(strip_separators(&chunks), text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }

    #[test]
    fn zero_room_in_full_chunk_forces_a_flush() {
        // Counts only 'a', so "bb" always fits but there is no room left.
        struct OnlyA;
        impl TokenCounter for OnlyA {
            fn count(&self, text: &str) -> usize {
                text.chars().filter(|c| *c == 'a').count()
            }
        }
        let chunker = BoundedChunker::new(Budget::new(2).unwrap()).with_counter(Box::new(OnlyA));
        let chunks = chunker.chunk(&units(&["aa", "bb"]));
        assert_eq!(chunks, vec!["\naa".to_string(), "\nbb".to_string()]);
    }

    #[test]
    fn non_positive_budgets_are_rejected() {
        assert!(matches!(
            Budget::new(0),
            Err(DocsplitError::InvalidBudget { budget: 0 })
        ));
        assert!(Budget::new(-5).is_err());
        assert_eq!(Budget::new(5).unwrap().get(), 5);
    }

    #[test]
    fn char_budget_slices_by_characters() {
        assert_eq!(CharBudget.slice_chars("abcdef", 4, &EstimateCounter), 4);
        assert_eq!(CharBudget.slice_chars("ab", 4, &EstimateCounter), 2);
    }

    #[test]
    fn token_boundary_finds_longest_fitting_prefix() {
        // EstimateCounter: ceil(bytes / 4), so 2 tokens fit 8 chars.
        assert_eq!(TokenBoundary.slice_chars("abcdefghijkl", 2, &EstimateCounter), 8);
        assert_eq!(TokenBoundary.slice_chars("abc", 2, &EstimateCounter), 3);
        assert_eq!(TokenBoundary.slice_chars("abc", 0, &EstimateCounter), 0);
    }

    #[test]
    fn token_boundary_keeps_chunks_within_budget() {
        let text = "0123456789".repeat(30);
        let chunker = BoundedChunker::new(Budget::new(10).unwrap())
            .with_slicer(Box::new(TokenBoundary));
        let chunks = chunker.chunk(&units(&[text.as_str()]));
        assert_eq!(chunks.len(), 8); // 300 bytes / 40 bytes per chunk
        for chunk in &chunks {
            assert!(EstimateCounter.count(chunk.trim_start_matches('\n')) <= 10);
        }
        assert_eq!(strip_separators(&chunks), text);
    }

    #[test]
    fn char_budget_with_estimates_underfills() {
        // A 10 character slice measures 3 estimated tokens, so the first
        // chunk keeps taking shrinking slices: 10 + 7 + 5 + 3 + 2 + 1 chars.
        let text = "x".repeat(30);
        let chunker = BoundedChunker::new(Budget::new(10).unwrap());
        let chunks = chunker.chunk(&units(&[text.as_str()]));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].replace('\n', "").len(), 28);
        assert_eq!(chunks[1], "\nxx");
        assert_eq!(strip_separators(&chunks), text);
    }

    #[test]
    fn slicer_names() {
        assert!(slicer_by_name("chars").is_some());
        assert!(slicer_by_name("tokens").is_some());
        assert!(slicer_by_name("words").is_none());
    }
}
