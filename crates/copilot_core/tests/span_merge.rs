use std::collections::BTreeSet;

use copilot_core::domain::{BlockKey, BlockMarker, ContentType, Passage};
use copilot_core::merge::merge_overlapping;
use pretty_assertions::assert_eq;

const DOC: &str = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn passage(start: usize, end: usize) -> Passage {
    Passage {
        url: "https://canvas.example.edu/doc".to_string(),
        title: "Doc".to_string(),
        content_type: ContentType::WebContent,
        text: DOC[start..end].to_string(),
        start_index: start,
        markers: vec![BlockMarker {
            key: BlockKey::BlockId("0".to_string()),
            char_start: 0,
        }],
        contextual_header: String::new(),
    }
}

/// Small deterministic generator so the property below runs over many layouts.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn merged_spans_are_disjoint_and_cover_exactly_the_union() {
    let mut rng = Lcg(7);
    for _ in 0..500 {
        let count = 1 + rng.next(6);
        let mut passages = Vec::new();
        let mut covered = BTreeSet::new();
        for _ in 0..count {
            let start = rng.next(DOC.len());
            let end = start + rng.next(DOC.len() - start + 1);
            covered.extend(start..end);
            passages.push(passage(start, end));
        }

        let spans = merge_overlapping(&passages);

        for pair in spans.windows(2) {
            assert!(pair[0].end_index <= pair[1].start_index, "spans overlap: {pair:?}");
        }
        let mut from_spans = BTreeSet::new();
        for s in &spans {
            assert_eq!(s.text, DOC[s.start_index..s.end_index]);
            from_spans.extend(s.start_index..s.end_index);
        }
        assert_eq!(from_spans, covered);
        let total: usize = spans.iter().map(|s| s.text.len()).sum();
        assert_eq!(total, covered.len());
    }
}

#[test]
fn single_passage_passes_through_unchanged() {
    let p = passage(5, 20);
    let spans = merge_overlapping(std::slice::from_ref(&p));
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, p.text);
    assert_eq!((spans[0].start_index, spans[0].end_index), (5, 20));
}

#[test]
fn same_url_with_different_content_types_is_not_merged() {
    let web = passage(0, 10);
    let mut video = passage(5, 15);
    video.content_type = ContentType::VideoTranscript;
    let spans = merge_overlapping(&[web, video]);
    assert_eq!(spans.len(), 2);
}

#[test]
fn multibyte_text_merges_on_character_offsets() {
    let doc = "héllo wörld ünïcode";
    let mk = |start: usize, text: &str| Passage {
        text: text.to_string(),
        start_index: start,
        ..passage(0, 1)
    };
    // Characters 0..8 and 6..14.
    let a: String = doc.chars().take(8).collect();
    let b: String = doc.chars().skip(6).take(8).collect();
    let spans = merge_overlapping(&[mk(0, &a), mk(6, &b)]);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, doc.chars().take(14).collect::<String>());
    assert_eq!(spans[0].end_index, 14);
}
