use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{
    BlockKey, CitationEntry, ContentType, SourceBlock, SourceRecord, MAX_START_TIME_SECS,
};
use crate::error::AppError;

mod links;
mod markers;

use links::{add_time_range_to_title, add_timestamp_to_url, web_block_url};
use markers::{dedup_adjacent_markers, find_markers, rewrite_markers};

/// Tuning for video citation grouping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolveOptions {
    /// Max gap in seconds between consecutive cited blocks of one video citation.
    pub merge_threshold_secs: f64,
    /// Added to the last block's start time to close the displayed time range.
    pub trailing_pad_secs: i64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            merge_threshold_secs: 60.0,
            trailing_pad_secs: 15,
        }
    }
}

/// One user-facing citation and the source IDs folded into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CitationGroup {
    pub number: u32,
    pub url: String,
    pub title: String,
    pub content_type: ContentType,
    pub final_url: String,
    pub final_title: String,
    pub source_ids: Vec<u32>,
    pub keys: Vec<BlockKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedAnswer {
    pub text: String,
    pub citations: BTreeMap<u32, CitationEntry>,
}

/// `(source_ids, keys, final_url, final_title)` of one group before numbering.
type Built = (Vec<u32>, Vec<BlockKey>, String, String);

struct Pending<'a> {
    record: &'a SourceRecord,
    cited: Vec<&'a SourceBlock>,
}

/// Source IDs referenced by `[n]` markers. Markers too large for a source ID are left out here
/// and rejected when the answer is rewritten.
pub fn collect_cited_ids(answer: &str) -> BTreeSet<u32> {
    find_markers(answer)
        .into_iter()
        .filter_map(|m| m.digits.parse::<u32>().ok())
        .collect()
}

/// Web blocks are listed in page order.
fn finish_web(p: Pending<'_>) -> Built {
    let mut cited = p.cited;
    cited.sort_by_key(|b| (b.char_start, b.source_id));
    let ids = cited.iter().map(|b| b.source_id).collect();
    // A block straddling two spans of one page is cited once.
    let mut keys: Vec<BlockKey> = Vec::with_capacity(cited.len());
    for b in &cited {
        if !keys.contains(&b.key) {
            keys.push(b.key.clone());
        }
    }
    let final_url = web_block_url(&p.record.url, &keys);
    (ids, keys, final_url, p.record.title.clone())
}

fn whole_seconds(record: &SourceRecord, block: &SourceBlock) -> Result<(f64, i64), AppError> {
    match block.key.start_time() {
        Some(s) if (0.0..=MAX_START_TIME_SECS).contains(&s) => Ok((s, s.floor() as i64)),
        _ => Err(AppError::malformed("Cited video block has no usable start time").with_details(
            format!(
                "url={}; source_id={}; key={}",
                record.url, block.source_id, block.key
            ),
        )),
    }
}

fn video_groups(p: Pending<'_>, options: &ResolveOptions) -> Result<Vec<Built>, AppError> {
    let mut timed = Vec::with_capacity(p.cited.len());
    for block in &p.cited {
        let (secs, whole) = whole_seconds(p.record, block)?;
        timed.push((*block, secs, whole));
    }
    timed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut runs: Vec<Vec<(&SourceBlock, f64, i64)>> = Vec::new();
    for item in timed {
        match runs.last_mut() {
            Some(run)
                if run
                    .last()
                    .is_some_and(|prev| item.1 - prev.1 <= options.merge_threshold_secs) =>
            {
                run.push(item)
            }
            _ => runs.push(vec![item]),
        }
    }

    let mut out = Vec::with_capacity(runs.len());
    for run in runs {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            continue;
        };
        let end = last.2.checked_add(options.trailing_pad_secs).ok_or_else(|| {
            AppError::malformed("Video citation time range overflows").with_details(format!(
                "url={}; start_time={}; pad={}",
                p.record.url, last.1, options.trailing_pad_secs
            ))
        })?;
        out.push((
            run.iter().map(|(b, _, _)| b.source_id).collect(),
            run.iter().map(|(b, _, _)| b.key.clone()).collect(),
            add_timestamp_to_url(&p.record.url, first.2),
            add_time_range_to_title(&p.record.title, first.2, end),
        ));
    }
    Ok(out)
}

/// Fold the cited blocks of every source record into numbered citation groups.
///
/// Records are visited in bundle order. A web page yields one group holding every cited block
/// (records sharing a URL fold into the group the first of them opened). A video yields one group
/// per run of cited blocks whose consecutive start times are at most
/// `merge_threshold_secs` apart. Groups are numbered 1..K in the order they are emitted, which is
/// not necessarily the order markers appear in the answer.
///
/// Fails with `SOURCE_MALFORMED_METADATA` when a cited video block has no usable start time or
/// its time range does not fit in seconds.
pub fn group_citations(
    cited: &BTreeSet<u32>,
    sources: &[SourceRecord],
    options: &ResolveOptions,
) -> Result<Vec<CitationGroup>, AppError> {
    enum Slot<'a> {
        Web(Pending<'a>),
        Video(Pending<'a>),
    }

    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut web_by_url: HashMap<&str, usize> = HashMap::new();
    for record in sources {
        let matching: Vec<&SourceBlock> = record
            .blocks
            .iter()
            .filter(|b| cited.contains(&b.source_id))
            .collect();
        if matching.is_empty() {
            continue;
        }
        match record.content_type {
            ContentType::WebContent => match web_by_url.get(record.url.as_str()).copied() {
                Some(idx) => {
                    if let Slot::Web(p) = &mut slots[idx] {
                        p.cited.extend(matching);
                    }
                }
                None => {
                    web_by_url.insert(record.url.as_str(), slots.len());
                    slots.push(Slot::Web(Pending {
                        record,
                        cited: matching,
                    }));
                }
            },
            ContentType::VideoTranscript => slots.push(Slot::Video(Pending {
                record,
                cited: matching,
            })),
        }
    }

    let mut out = Vec::new();
    for slot in slots {
        let (record, built) = match slot {
            Slot::Web(p) => (p.record, vec![finish_web(p)]),
            Slot::Video(p) => (p.record, video_groups(p, options)?),
        };
        for (source_ids, keys, final_url, final_title) in built {
            let number = out.len() as u32 + 1;
            out.push(CitationGroup {
                number,
                url: record.url.clone(),
                title: record.title.clone(),
                content_type: record.content_type,
                final_url,
                final_title,
                source_ids,
                keys,
            });
        }
    }
    Ok(out)
}

/// Rewrite the generated answer's source-ID markers into compact citation numbers.
///
/// Fails with `CITATION_UNKNOWN_REFERENCE` if any marker cites a source ID that no record
/// carries; nothing is returned in that case.
pub fn resolve_citations(
    answer: &str,
    sources: &[SourceRecord],
    options: &ResolveOptions,
) -> Result<ResolvedAnswer, AppError> {
    let cited = collect_cited_ids(answer);
    let groups = group_citations(&cited, sources, options)?;

    let mut mapping: HashMap<u32, u32> = HashMap::new();
    for g in &groups {
        for id in &g.source_ids {
            mapping.insert(*id, g.number);
        }
    }

    let rewritten = rewrite_markers(answer, &mapping)?;
    let text = dedup_adjacent_markers(&rewritten);

    let citations = groups
        .into_iter()
        .map(|g| {
            (
                g.number,
                CitationEntry {
                    url: g.final_url,
                    title: g.final_title,
                    content_type: g.content_type,
                },
            )
        })
        .collect();

    Ok(ResolvedAnswer { text, citations })
}
