use std::collections::HashMap;
use std::ops::Range;

use crate::error::{AppError, UNKNOWN_CITATION_REFERENCE};

/// An inline `[<digits>]` citation marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Marker<'a> {
    pub range: Range<usize>,
    pub digits: &'a str,
}

/// Find every `[<ascii digits>]` marker, left to right, non-overlapping.
pub(crate) fn find_markers(text: &str) -> Vec<Marker<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > start && j < bytes.len() && bytes[j] == b']' {
                out.push(Marker {
                    range: i..j + 1,
                    digits: &text[start..j],
                });
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Replace every marker's source ID with its citation number.
///
/// A marker whose ID has no mapping (or does not fit a source ID) fails the whole rewrite.
pub(crate) fn rewrite_markers(text: &str, mapping: &HashMap<u32, u32>) -> Result<String, AppError> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for m in find_markers(text) {
        let number = m
            .digits
            .parse::<u32>()
            .ok()
            .and_then(|id| mapping.get(&id))
            .ok_or_else(|| {
                AppError::new(
                    UNKNOWN_CITATION_REFERENCE,
                    "Answer cites a source ID that was never provided",
                )
                .with_details(format!("source_id={}", m.digits))
            })?;
        out.push_str(&text[cursor..m.range.start]);
        out.push_str(&format!("[{number}]"));
        cursor = m.range.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Drop repeated markers inside each run of directly adjacent markers (`[2][2][3]` -> `[2][3]`).
///
/// Runs separated by any other text are independent.
pub(crate) fn dedup_adjacent_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut run: Vec<&str> = Vec::new();
    for m in find_markers(text) {
        if m.range.start > cursor {
            out.push_str(&text[cursor..m.range.start]);
            run.clear();
        }
        if !run.contains(&m.digits) {
            run.push(m.digits);
            out.push_str(&text[m.range.clone()]);
        }
        cursor = m.range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_only_numeric_markers() {
        let digits: Vec<_> = find_markers("a[1] b[x] c[[22]] d\\[3\\] e[] f[4")
            .into_iter()
            .map(|m| m.digits)
            .collect();
        assert_eq!(digits, vec!["1", "22"]);
    }

    #[test]
    fn dedup_is_local_to_each_run() {
        assert_eq!(dedup_adjacent_markers("a[1][1]b[1]"), "a[1]b[1]");
        assert_eq!(dedup_adjacent_markers("[2][2][3][2]."), "[2][3].");
        assert_eq!(dedup_adjacent_markers("x[2] [2]"), "x[2] [2]");
    }

    #[test]
    fn rewrite_fails_on_unmapped_or_oversized_ids() {
        let mapping = HashMap::from([(0u32, 1u32)]);
        assert_eq!(rewrite_markers("ok[0].", &mapping).unwrap(), "ok[1].");
        let err = rewrite_markers("bad[7]", &mapping).unwrap_err();
        assert_eq!(err.code, UNKNOWN_CITATION_REFERENCE);
        assert!(rewrite_markers("big[99999999999]", &mapping).is_err());
    }
}
