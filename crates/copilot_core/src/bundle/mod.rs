use serde::{Deserialize, Serialize};

use crate::domain::{ContentType, MergedSpan, Passage, SourceBlock, SourceRecord};
use crate::error::AppError;
use crate::merge::merge_overlapping;
use crate::split::{escape_square_brackets, split_span};
use crate::text::sha256_hex;

/// Rendered sources for the generation step plus the side-table the resolver needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceBundle {
    pub content: String,
    pub content_sha256: String,
    pub sources: Vec<SourceRecord>,
}

impl SourceBundle {
    pub fn source_id_count(&self) -> usize {
        self.sources.iter().map(|s| s.blocks.len()).sum()
    }
}

fn check_passage(p: &Passage) -> Result<(), AppError> {
    if p.url.trim().is_empty() {
        return Err(AppError::malformed("Passage is missing its document URL")
            .with_details(format!("title={}; start_index={}", p.title, p.start_index)));
    }
    Ok(())
}

/// Merge, split and render a batch of retrieved passages.
pub fn build_bundle(passages: &[Passage]) -> Result<SourceBundle, AppError> {
    for p in passages {
        check_passage(p)?;
    }
    let spans = merge_overlapping(passages);
    format_sources(&spans)
}

/// Render merged spans into one citation-tagged text blob.
///
/// Web content is rendered before video transcripts; within a content type spans keep their
/// input order. Source IDs start at 0 and increase by one per block across the whole bundle.
pub fn format_sources(spans: &[MergedSpan]) -> Result<SourceBundle, AppError> {
    let ordered = spans
        .iter()
        .filter(|s| s.content_type == ContentType::WebContent)
        .chain(
            spans
                .iter()
                .filter(|s| s.content_type == ContentType::VideoTranscript),
        );

    let mut next_id: u32 = 0;
    let mut content = String::new();
    let mut sources = Vec::new();
    for span in ordered {
        let slices = split_span(span)?;

        let mut blocks = Vec::with_capacity(slices.len());
        let mut rendered = String::new();
        for slice in slices {
            rendered.push_str(&format!(
                "[{next_id}]\n{}\n",
                escape_square_brackets(&slice.text).trim()
            ));
            blocks.push(SourceBlock {
                source_id: next_id,
                key: slice.key,
                char_start: slice.char_start,
                text_sha256: sha256_hex(&slice.text),
                text: slice.text,
            });
            next_id += 1;
        }

        content.push_str(&format!(
            "===\nTITLE: {} {}\nDESCRIPTION: {}\n---\nCONTENT:\n{rendered}\n",
            span.content_type.section_label(),
            span.title,
            span.contextual_header
        ));
        sources.push(SourceRecord {
            url: span.url.clone(),
            title: span.title.clone(),
            content_type: span.content_type,
            contextual_header: span.contextual_header.clone(),
            blocks,
        });
    }

    Ok(SourceBundle {
        content_sha256: sha256_hex(&content),
        content,
        sources,
    })
}
