use std::collections::HashMap;

use crate::domain::{ContentType, MergedSpan, Passage};
use crate::text::{char_len, skip_chars};

fn open_span(p: &Passage) -> MergedSpan {
    MergedSpan {
        url: p.url.clone(),
        title: p.title.clone(),
        content_type: p.content_type,
        contextual_header: p.contextual_header.clone(),
        start_index: p.start_index,
        end_index: p.end_index(),
        text: p.text.clone(),
        markers: p.markers.clone(),
    }
}

/// Merge overlapping passages of the same document into disjoint spans.
///
/// Documents are keyed by `(content_type, url)` and emitted in order of first appearance; the
/// spans of one document come out ordered by start offset. Passages that only touch
/// (`next.start == running.end`) stay separate spans.
pub fn merge_overlapping(passages: &[Passage]) -> Vec<MergedSpan> {
    let mut order: Vec<Vec<&Passage>> = Vec::new();
    let mut by_doc: HashMap<(ContentType, &str), usize> = HashMap::new();
    for p in passages {
        let idx = *by_doc
            .entry((p.content_type, p.url.as_str()))
            .or_insert_with(|| {
                order.push(Vec::new());
                order.len() - 1
            });
        order[idx].push(p);
    }

    let mut out = Vec::new();
    for mut group in order {
        // Stable: equal starts keep input order.
        group.sort_by_key(|p| p.start_index);

        let mut spans: Vec<MergedSpan> = Vec::new();
        for p in group {
            match spans.last_mut() {
                Some(running) if p.start_index < running.end_index => {
                    let overlap = running.end_index - p.start_index;
                    if overlap < char_len(&p.text) {
                        running.text.push_str(skip_chars(&p.text, overlap));
                    }
                    running.end_index = running.end_index.max(p.end_index());
                }
                _ => spans.push(open_span(p)),
            }
        }
        out.extend(spans);
    }
    out
}
