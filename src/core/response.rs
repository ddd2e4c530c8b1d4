//! Reply size limits and text chunking
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Count characters instead of bytes, shared `truncate` helper
//! - 1.0.0: Message and embed chunking for long replies

/// Plain message content limit, in characters
pub const MESSAGE_LIMIT: usize = 2000;
/// Embed description limit, in characters
pub const EMBED_LIMIT: usize = 4096;

const ELLIPSIS: &str = "...";

/// Split text into pieces of at most `max_chars` characters.
///
/// Splits on line boundaries when it can and falls back to splitting inside a
/// line only when a single line is longer than the limit.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count() + 1;
        if current_len + line_len > max_chars {
            if !current.is_empty() {
                chunks.push(current.trim_end().to_string());
                current.clear();
                current_len = 0;
            }
            if line_len > max_chars {
                chunks.extend(split_line(line, max_chars));
                continue;
            }
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len;
    }

    if !current.trim_end().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

fn split_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

pub fn chunk_for_embed(text: &str) -> Vec<String> {
    chunk_text(text, EMBED_LIMIT)
}

/// Cut text down to `max_chars` characters, ending in "..." when shortened
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn truncate_for_message(text: &str) -> String {
    truncate(text, MESSAGE_LIMIT)
}

pub fn truncate_for_embed(text: &str) -> String {
    truncate(text, EMBED_LIMIT)
}

/// Escape Discord markdown control characters in user supplied text
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '`' | '~' | '|' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Group digits in thousands: 1234567 -> "1,234,567"
pub fn with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
