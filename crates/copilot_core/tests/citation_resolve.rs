use std::collections::BTreeSet;

use copilot_core::bundle::build_bundle;
use copilot_core::domain::{BlockKey, CitationEntry, ContentType, SourceBlock, SourceRecord};
use copilot_core::ingest::decode_search_hits;
use copilot_core::resolve::{group_citations, resolve_citations, ResolveOptions};
use pretty_assertions::assert_eq;

fn record(
    url: &str,
    title: &str,
    content_type: ContentType,
    blocks: Vec<(u32, BlockKey, usize)>,
) -> SourceRecord {
    SourceRecord {
        url: url.to_string(),
        title: title.to_string(),
        content_type,
        contextual_header: String::new(),
        blocks: blocks
            .into_iter()
            .map(|(id, key, char_start)| SourceBlock {
                source_id: id,
                key,
                char_start,
                text: format!("block {id}"),
                text_sha256: String::new(),
            })
            .collect(),
    }
}

fn web(url: &str, blocks: &[(u32, usize)]) -> SourceRecord {
    let blocks = blocks
        .iter()
        .map(|&(id, c)| (id, BlockKey::BlockId(c.to_string()), c))
        .collect();
    record(url, "Reading", ContentType::WebContent, blocks)
}

fn video(url: &str, blocks: &[(u32, f64)]) -> SourceRecord {
    let blocks = blocks
        .iter()
        .enumerate()
        .map(|(i, &(id, t))| (id, BlockKey::StartTime(t), i * 50))
        .collect();
    record(url, "Lecture", ContentType::VideoTranscript, blocks)
}

#[test]
fn web_blocks_become_one_block_link() {
    let sources = vec![web("https://x/doc", &[(0, 3), (1, 5), (2, 7)])];
    let out = resolve_citations("Claim[2] and[0].", &sources, &ResolveOptions::default())
        .expect("resolve");
    assert_eq!(out.text, "Claim[1] and[1].");
    assert_eq!(
        out.citations.get(&1),
        Some(&CitationEntry {
            url: "https://x/doc/block/3,7".to_string(),
            title: "Reading".to_string(),
            content_type: ContentType::WebContent,
        })
    );
    assert_eq!(out.citations.len(), 1);
}

#[test]
fn video_blocks_group_by_gap_threshold() {
    let sources = vec![video(
        "https://v.example/watch?v=q1",
        &[(0, 10.0), (1, 40.0), (2, 50.0), (3, 200.0)],
    )];
    let cited: BTreeSet<u32> = [0, 1, 2, 3].into_iter().collect();
    let groups = group_citations(&cited, &sources, &ResolveOptions::default()).expect("group");

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].source_ids, vec![0, 1, 2]);
    assert_eq!(groups[1].source_ids, vec![3]);
    assert_eq!(groups[0].final_url, "https://v.example/watch?v=q1&t=10");
    assert_eq!(groups[0].final_title, "Lecture (0:00:10-0:01:05)");
    assert_eq!(groups[1].final_url, "https://v.example/watch?v=q1&t=200");
    assert_eq!(groups[1].final_title, "Lecture (0:03:20-0:03:35)");
}

#[test]
fn gap_equal_to_threshold_stays_in_group() {
    let sources = vec![video("https://v/x", &[(0, 0.0), (1, 60.0), (2, 121.0)])];
    let cited: BTreeSet<u32> = [0, 1, 2].into_iter().collect();
    let groups = group_citations(&cited, &sources, &ResolveOptions::default()).expect("group");
    let ids: Vec<Vec<u32>> = groups.iter().map(|g| g.source_ids.clone()).collect();
    assert_eq!(ids, vec![vec![0, 1], vec![2]]);
}

#[test]
fn fractional_start_times_floor_in_links() {
    let sources = vec![video("https://v/x", &[(0, 12.9), (1, 30.5)])];
    let out = resolve_citations("a[0][1]", &sources, &ResolveOptions::default()).expect("resolve");
    assert_eq!(out.text, "a[1]");
    assert_eq!(out.citations[&1].url, "https://v/x?t=12");
    assert_eq!(out.citations[&1].title, "Lecture (0:00:12-0:00:45)");
}

#[test]
fn numbering_follows_record_order_not_text_order() {
    let sources = vec![
        web("https://x/a", &[(0, 0), (1, 10)]),
        web("https://x/b", &[(2, 0)]),
        video("https://v/c", &[(3, 0.0), (4, 500.0)]),
    ];
    let answer = "First[4], then[2], then[1], again[3].";
    let out = resolve_citations(answer, &sources, &ResolveOptions::default()).expect("resolve");

    assert_eq!(out.text, "First[4], then[2], then[1], again[3].");
    let urls: Vec<&str> = out.citations.values().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://x/a/block/10", "https://x/b/block/0", "https://v/c?t=0", "https://v/c?t=500"]
    );
    let keys: Vec<u32> = out.citations.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3, 4]);
}

#[test]
fn records_sharing_a_web_url_fold_into_one_citation() {
    // The same page split into two disjoint spans; block 40 straddles both.
    let sources = vec![
        web("https://x/page", &[(0, 0), (1, 40)]),
        video("https://v/y", &[(2, 5.0)]),
        web("https://x/page", &[(3, 40), (4, 90)]),
    ];
    let out = resolve_citations("p[4] q[1] r[3] s[2]", &sources, &ResolveOptions::default())
        .expect("resolve");
    assert_eq!(out.text, "p[1] q[1] r[1] s[2]");
    assert_eq!(out.citations[&1].url, "https://x/page/block/40,90");
    assert_eq!(out.citations[&2].url, "https://v/y?t=5");
}

#[test]
fn opaque_web_block_ids_follow_page_order() {
    let blocks = vec![
        (0, BlockKey::BlockId("zz-intro".to_string()), 0),
        (1, BlockKey::BlockId("cl6p3hbfn000c3b6l0aq4oyc8".to_string()), 40),
        (2, BlockKey::BlockId("aa-summary".to_string()), 90),
    ];
    let sources = vec![record("https://x/lesson", "Lesson", ContentType::WebContent, blocks)];
    let out = resolve_citations("a[2] b[0] c[1]", &sources, &ResolveOptions::default())
        .expect("resolve");
    assert_eq!(out.text, "a[1] b[1] c[1]");
    assert_eq!(
        out.citations[&1].url,
        "https://x/lesson/block/zz-intro,cl6p3hbfn000c3b6l0aq4oyc8,aa-summary"
    );
}

#[test]
fn unusable_video_start_times_fail_instead_of_overflowing() {
    let sources = vec![video("https://v/x", &[(0, 1e19)])];
    let err = resolve_citations("a[0]", &sources, &ResolveOptions::default())
        .expect_err("should fail");
    assert_eq!(err.code, "SOURCE_MALFORMED_METADATA");

    let sources = vec![video("https://v/x", &[(0, 10.0)])];
    let opts = ResolveOptions {
        merge_threshold_secs: 60.0,
        trailing_pad_secs: i64::MAX,
    };
    let err = resolve_citations("a[0]", &sources, &opts).expect_err("should fail");
    assert_eq!(err.code, "SOURCE_MALFORMED_METADATA");

    let sources = vec![record(
        "https://v/x",
        "Lecture",
        ContentType::VideoTranscript,
        vec![(0, BlockKey::BlockId("b1".to_string()), 0)],
    )];
    assert!(resolve_citations("a[0]", &sources, &ResolveOptions::default()).is_err());
}

#[test]
fn adjacent_duplicates_collapse_only_within_a_run() {
    let sources = vec![web("https://x/a", &[(0, 0), (1, 10)]), web("https://x/b", &[(2, 0)])];
    let out = resolve_citations("a[0][1]b[0] c[2][0][2]", &sources, &ResolveOptions::default())
        .expect("resolve");
    assert_eq!(out.text, "a[1]b[1] c[2][1]");
}

#[test]
fn unknown_source_id_aborts_resolution() {
    let sources = vec![web("https://x/a", &[(0, 0)])];
    let err = resolve_citations("ok[0] hallucinated[9]", &sources, &ResolveOptions::default())
        .expect_err("should fail");
    assert_eq!(err.code, "CITATION_UNKNOWN_REFERENCE");
    assert_eq!(err.details.as_deref(), Some("source_id=9"));

    let err = resolve_citations("huge[4294967296]", &sources, &ResolveOptions::default())
        .expect_err("should fail");
    assert_eq!(err.code, "CITATION_UNKNOWN_REFERENCE");
}

#[test]
fn answer_without_markers_has_no_citations() {
    let sources = vec![web("https://x/a", &[(0, 0)])];
    let out = resolve_citations(
        "I'm sorry, nothing relevant \\[yet\\].",
        &sources,
        &ResolveOptions::default(),
    )
    .expect("resolve");
    assert_eq!(out.text, "I'm sorry, nothing relevant \\[yet\\].");
    assert!(out.citations.is_empty());
}

#[test]
fn custom_options_change_grouping_and_padding() {
    let sources = vec![video("https://v/x", &[(0, 0.0), (1, 30.0)])];
    let opts = ResolveOptions {
        merge_threshold_secs: 10.0,
        trailing_pad_secs: 30,
    };
    let out = resolve_citations("a[0][1]", &sources, &opts).expect("resolve");
    assert_eq!(out.text, "a[1][2]");
    assert_eq!(out.citations[&2].title, "Lecture (0:00:30-0:01:00)");
}

#[test]
fn fixture_end_to_end_is_deterministic() {
    let raw = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/search_hits.json"
    ));
    let passages = decode_search_hits(raw).expect("decode");
    let bundle = build_bundle(&passages).expect("bundle");

    let answer = "Prices rise when demand outpaces supply[1][1][2]. \
Elasticity measures responsiveness[5][4]. Worked examples help[7]. Also[0].";
    let first = resolve_citations(answer, &bundle.sources, &ResolveOptions::default())
        .expect("resolve");
    let second = resolve_citations(answer, &bundle.sources, &ResolveOptions::default())
        .expect("resolve");
    assert_eq!(first, second);

    assert_eq!(
        first.text,
        "Prices rise when demand outpaces supply[1]. \
Elasticity measures responsiveness[2]. Worked examples help[3]. Also[1]."
    );
    assert_eq!(
        first.citations[&1].url,
        "https://canvas.example.edu/courses/101/modules/3/block/0,43,114"
    );
    assert_eq!(first.citations[&1].title, "Module 3: Supply and Demand");
    assert_eq!(first.citations[&2].url, "https://www.youtube.com/watch?v=abc123&t=30");
    assert_eq!(first.citations[&2].title, "Lecture 3: Elasticity (0:00:30-0:01:15)");
    assert_eq!(first.citations[&3].url, "https://www.youtube.com/watch?v=abc123&t=240");
    assert_eq!(first.citations[&3].title, "Lecture 3: Elasticity (0:04:00-0:04:15)");
    assert_eq!(first.citations.len(), 3);
}
