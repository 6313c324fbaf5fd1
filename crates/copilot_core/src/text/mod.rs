//! Character-offset helpers.
//!
//! Retrieval offsets count characters (Unicode scalar values), so every slice taken by the
//! merger and the splitter goes through here instead of indexing bytes directly.

use sha2::{Digest, Sha256};

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Slice `text` by character positions. Out-of-range bounds clamp to the end; an empty or
/// inverted range yields `""`.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let from = byte_offset(text, start);
    let to = byte_offset(text, end);
    &text[from..to]
}

/// Everything after the first `skip` characters.
pub fn skip_chars(text: &str, skip: usize) -> &str {
    &text[byte_offset(text, skip)..]
}

pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
