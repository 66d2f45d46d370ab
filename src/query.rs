//! Prompt construction and cleanup of the model's echoed prompt.

const QUERY_MARKER: &str = "Query:";

pub fn build_prompt(page_data: &str, query: &str) -> String {
    format!("Page Data: {page_data}\n{QUERY_MARKER} {query}")
}

pub fn inferred_query(query: &str) -> String {
    format!("Understood as: '{query}'")
}

/// Removes the echoed prompt from `raw`, the decoded prompt-plus-continuation.
///
/// An exact prompt prefix is stripped first. Failing that (decoding does not
/// always round-trip), everything through `Query: {query}` measured from the
/// first `Query:` is dropped.
pub fn strip_prompt_echo<'a>(raw: &'a str, prompt: &str, query: &str) -> &'a str {
    if let Some(rest) = raw.strip_prefix(prompt) {
        return rest.trim();
    }

    match raw.find(QUERY_MARKER) {
        Some(start) => {
            let mut cut = start + QUERY_MARKER.len() + 1 + query.len();
            if cut >= raw.len() {
                return "";
            }
            while !raw.is_char_boundary(cut) {
                cut += 1;
            }
            raw[cut..].trim()
        }
        None => raw.trim(),
    }
}
