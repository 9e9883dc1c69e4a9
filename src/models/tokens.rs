/// Approximate token count using the ~4 chars per token heuristic.
const CHARS_PER_TOKEN: f64 = 4.0;

/// Fallback input limit for embedding models missing from the table.
pub const DEFAULT_MAX_TOKENS: usize = 512;

/// Embedding model used when no model is configured.
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";

/// Known embedding models and their maximum input tokens.
const MODEL_LIMITS: &[(&str, usize)] = &[
    ("text-embedding-ada-002", 8191),
    ("text-embedding-3-small", 8191),
    ("text-embedding-3-large", 8191),
    ("all-MiniLM-L6-v2", 256),
    ("nomic-embed-text", 8192),
    ("bge-small-en-v1.5", 512),
];

/// Counts tokens the way the target embedding model would.
///
/// Counts need not be additive under concatenation; the chunker re-measures
/// every slice it appends.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Heuristic counter: ceil(bytes / 4).
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateCounter;

impl TokenCounter for EstimateCounter {
    fn count(&self, text: &str) -> usize {
        estimate_tokens(text.len())
    }
}

/// One token per character. Useful when the budget is a character budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Build a counter from its configured name ("estimate" or "chars").
#[must_use]
pub fn counter_by_name(name: &str) -> Option<Box<dyn TokenCounter>> {
    match name {
        "estimate" => Some(Box::new(EstimateCounter)),
        "chars" => Some(Box::new(CharCounter)),
        _ => None,
    }
}

/// Estimate tokens from a byte count.
#[must_use]
pub fn estimate_tokens(byte_count: usize) -> usize {
    (byte_count as f64 / CHARS_PER_TOKEN).ceil() as usize
}

/// Maximum input tokens for an embedding model.
#[must_use]
pub fn max_tokens_for(model: &str) -> usize {
    MODEL_LIMITS
        .iter()
        .find(|(name, _)| *name == model)
        .map_or(DEFAULT_MAX_TOKENS, |(_, limit)| *limit)
}

/// Names of all models in the limit table.
#[must_use]
pub fn known_models() -> Vec<&'static str> {
    MODEL_LIMITS.iter().map(|(name, _)| *name).collect()
}
