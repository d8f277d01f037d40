//! Discord length limits for outbound content
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Single `truncate` over an arbitrary limit, autocomplete choice limit
//! - 1.0.0: Message/embed chunking

/// Embed description limit
pub const EMBED_LIMIT: usize = 4096;
/// Message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Maximum number of autocomplete choices per response
pub const AUTOCOMPLETE_LIMIT: usize = 25;

const ELLIPSIS: &str = "...";

/// Largest char boundary in `text` that is `<= index`
fn floor_boundary(text: &str, index: usize) -> usize {
    let mut end = index.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Truncate `text` to at most `limit` bytes, ending in "..." when cut
pub fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let end = floor_boundary(text, limit.saturating_sub(ELLIPSIS.len()));
    format!("{}{ELLIPSIS}", &text[..end])
}

pub fn truncate_for_message(text: &str) -> String {
    truncate(text, MESSAGE_LIMIT)
}

pub fn truncate_for_embed(text: &str) -> String {
    truncate(text, EMBED_LIMIT)
}

/// Split text into pieces of at most `max_size` bytes
///
/// Prefers line boundaries; a single line longer than `max_size` is cut at
/// char boundaries.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        // +1 for the newline joining it to `current`
        if !current.is_empty() && current.len() + 1 + line.len() > max_size {
            chunks.push(std::mem::take(&mut current));
        }

        if line.len() > max_size {
            let mut rest = line;
            while rest.len() > max_size {
                let cut = floor_boundary(rest, max_size).max(1);
                let cut = if rest.is_char_boundary(cut) {
                    cut
                } else {
                    rest.char_indices().nth(1).map(|(i, _)| i).unwrap_or(rest.len())
                };
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current = rest.to_string();
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}
