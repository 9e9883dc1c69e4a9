use serde::Serialize;

/// Format a result as minified JSON.
pub fn format_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string(result).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Format items as JSON lines, one minified object per line.
pub fn format_jsonl<T: Serialize>(items: &[T]) -> String {
    items
        .iter()
        .map(format_json)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an error as JSON.
pub fn format_error(err: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}
