use crate::domain::{BlockKey, BlockMarker, ContentType, MergedSpan, MAX_START_TIME_SECS};
use crate::error::AppError;
use crate::text::{char_len, slice_chars};

/// One block of a span before source IDs are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSlice {
    pub key: BlockKey,
    pub char_start: usize,
    pub text: String,
}

/// Escape literal square brackets so they can't be mistaken for citation markers.
pub fn escape_square_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '[' || ch == ']' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Check a document's marker list against its content type.
///
/// Contract:
/// - at least one marker;
/// - `char_start` is non-decreasing;
/// - every key matches the content type (block ID for web, seconds for video);
/// - web block IDs are non-empty;
/// - video start times are finite, non-negative and at most [`MAX_START_TIME_SECS`].
pub fn validate_markers(
    url: &str,
    content_type: ContentType,
    markers: &[BlockMarker],
) -> Result<(), AppError> {
    if markers.is_empty() {
        return Err(AppError::malformed("Document has no block markers")
            .with_details(format!("url={url}")));
    }
    for (i, m) in markers.iter().enumerate() {
        if m.key.content_type() != content_type {
            return Err(AppError::malformed("Block marker kind does not match content type")
                .with_details(format!(
                    "url={url}; marker={i}; content_type={content_type}"
                )));
        }
        match &m.key {
            BlockKey::StartTime(s) if !(0.0..=MAX_START_TIME_SECS).contains(s) => {
                return Err(AppError::malformed("Block start time is out of range")
                    .with_details(format!("url={url}; marker={i}; start_time={s}")));
            }
            BlockKey::BlockId(id) if id.trim().is_empty() => {
                return Err(AppError::malformed("Block ID must not be empty")
                    .with_details(format!("url={url}; marker={i}")));
            }
            _ => {}
        }
        if i > 0 && m.char_start < markers[i - 1].char_start {
            return Err(AppError::malformed("Block markers are not ordered by char_start")
                .with_details(format!(
                    "url={url}; marker={i}; char_start={}; previous={}",
                    m.char_start,
                    markers[i - 1].char_start
                )));
        }
    }
    Ok(())
}

/// Cut a merged span into the blocks its markers define.
///
/// Block `i` covers `[markers[i].char_start, markers[i + 1].char_start)` of the document; the
/// last block runs to the end of the document. Only blocks overlapping the span are kept, clamped
/// to the span and re-based into its text, so spans that start or end mid-block yield partial
/// blocks. Zero-width blocks (two markers at the same position) are skipped.
pub fn split_span(span: &MergedSpan) -> Result<Vec<BlockSlice>, AppError> {
    validate_markers(&span.url, span.content_type, &span.markers)?;

    let span_len = char_len(&span.text);
    let mut out = Vec::new();
    for (i, marker) in span.markers.iter().enumerate() {
        let block_start = marker.char_start;
        let block_end = span
            .markers
            .get(i + 1)
            .map(|next| next.char_start)
            .unwrap_or(usize::MAX);
        if block_start >= block_end {
            continue;
        }
        if span.start_index < block_end && span.end_index > block_start {
            let slice_start = block_start.saturating_sub(span.start_index);
            let slice_end = span_len.min(block_end - span.start_index);
            out.push(BlockSlice {
                key: marker.key.clone(),
                char_start: marker.char_start,
                text: slice_chars(&span.text, slice_start, slice_end).to_string(),
            });
        }
    }
    Ok(out)
}
