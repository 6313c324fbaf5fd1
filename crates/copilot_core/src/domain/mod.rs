use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, UNSUPPORTED_CONTENT_TYPE};
use crate::text::char_len;

/// Kind of course content a passage was retrieved from.
///
/// Serialized with the names the search index uses (`html_content`, `video_transcript`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    #[serde(rename = "html_content")]
    WebContent,
    #[serde(rename = "video_transcript")]
    VideoTranscript,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::WebContent => "html_content",
            ContentType::VideoTranscript => "video_transcript",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "html_content" => Ok(ContentType::WebContent),
            "video_transcript" => Ok(ContentType::VideoTranscript),
            other => Err(AppError::new(
                UNSUPPORTED_CONTENT_TYPE,
                "Unsupported source content type",
            )
            .with_details(format!("content_type={other}"))),
        }
    }

    /// Label used in the `TITLE:` line of a rendered source section.
    pub fn section_label(&self) -> &'static str {
        match self {
            ContentType::WebContent => "Submodule",
            ContentType::VideoTranscript => "Video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest block start time accepted from a transcript, in seconds (about 31 years).
pub const MAX_START_TIME_SECS: f64 = 1.0e9;

/// Identifier of one block inside its document.
///
/// Web content is addressed by the page's opaque `data-block-id`; video transcripts by the start
/// time of the block in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKey {
    BlockId(String),
    StartTime(f64),
}

impl BlockKey {
    pub fn content_type(&self) -> ContentType {
        match self {
            BlockKey::BlockId(_) => ContentType::WebContent,
            BlockKey::StartTime(_) => ContentType::VideoTranscript,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        match self {
            BlockKey::BlockId(_) => None,
            BlockKey::StartTime(s) => Some(*s),
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKey::BlockId(id) => f.write_str(id),
            BlockKey::StartTime(s) if s.fract() == 0.0 => write!(f, "{}", *s as u64),
            BlockKey::StartTime(s) => write!(f, "{s}"),
        }
    }
}

/// Boundary of one block within the full document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockMarker {
    pub key: BlockKey,
    pub char_start: usize,
}

/// One retrieved chunk of a course document.
///
/// `markers` is document-level metadata: every passage of the same document carries the same
/// list, ordered by `char_start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    pub url: String,
    pub title: String,
    pub content_type: ContentType,
    pub text: String,
    pub start_index: usize,
    pub markers: Vec<BlockMarker>,
    pub contextual_header: String,
}

impl Passage {
    pub fn end_index(&self) -> usize {
        self.start_index + char_len(&self.text)
    }
}

/// Overlap-free contiguous text range of one document, built from one or more passages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedSpan {
    pub url: String,
    pub title: String,
    pub content_type: ContentType,
    pub contextual_header: String,
    pub start_index: usize,
    pub end_index: usize,
    pub text: String,
    pub markers: Vec<BlockMarker>,
}

/// A block after source IDs were assigned by the bundle formatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceBlock {
    pub source_id: u32,
    pub key: BlockKey,
    /// Document-level character index the block starts at.
    pub char_start: usize,
    /// Raw (unescaped) slice of the span text.
    pub text: String,
    pub text_sha256: String,
}

/// Side-table entry for one document span; consumed by the citation resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRecord {
    pub url: String,
    pub title: String,
    pub content_type: ContentType,
    pub contextual_header: String,
    pub blocks: Vec<SourceBlock>,
}

impl SourceRecord {
    pub fn source_ids(&self) -> Vec<u32> {
        self.blocks.iter().map(|b| b.source_id).collect()
    }
}

/// User-facing citation, keyed by its compact number in the final answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationEntry {
    pub url: String,
    pub title: String,
    pub content_type: ContentType,
}
