//! Decoding of raw hybrid-search rows into passages.
//!
//! The search index stores web pages and video transcripts with different field names; the
//! block-marker list travels as a JSON-encoded string (`index_metadata`).

use serde_json::{Map, Value};

use crate::domain::{BlockKey, BlockMarker, ContentType, Passage, MAX_START_TIME_SECS};
use crate::error::AppError;

/// Field names the search index uses for one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitFields {
    pub url_key: &'static str,
    pub title_key: &'static str,
    pub block_id_key: &'static str,
}

pub fn hit_fields(content_type: ContentType) -> HitFields {
    match content_type {
        ContentType::WebContent => HitFields {
            url_key: "submodule_url",
            title_key: "submodule_title",
            block_id_key: "data_block_id",
        },
        ContentType::VideoTranscript => HitFields {
            url_key: "video_url",
            title_key: "video_title",
            block_id_key: "start_time",
        },
    }
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str, ctx: &str) -> Result<&'a Value, AppError> {
    obj.get(key).filter(|v| !v.is_null()).ok_or_else(|| {
        AppError::malformed("Search hit is missing a required field")
            .with_details(format!("field={key}; {ctx}"))
    })
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str, ctx: &str) -> Result<&'a str, AppError> {
    field(obj, key, ctx)?.as_str().ok_or_else(|| {
        AppError::malformed("Search hit field must be a string")
            .with_details(format!("field={key}; {ctx}"))
    })
}

fn index_field(obj: &Map<String, Value>, key: &str, ctx: &str) -> Result<usize, AppError> {
    field(obj, key, ctx)?
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            AppError::malformed("Search hit field must be a non-negative integer")
                .with_details(format!("field={key}; {ctx}"))
        })
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Web block IDs are the page's opaque `data-block-id` attribute; bare numbers are accepted and
/// kept in their decimal form.
fn block_key(content_type: ContentType, v: &Value) -> Option<BlockKey> {
    match content_type {
        ContentType::WebContent => match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
            _ => None,
        }
        .map(BlockKey::BlockId),
        ContentType::VideoTranscript => number_value(v)
            .filter(|s| (0.0..=MAX_START_TIME_SECS).contains(s))
            .map(BlockKey::StartTime),
    }
}

fn decode_markers(
    raw: &Value,
    content_type: ContentType,
    fields: HitFields,
    ctx: &str,
) -> Result<Vec<BlockMarker>, AppError> {
    let parsed;
    let list = match raw {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s).map_err(|e| {
                AppError::malformed("Failed to decode index_metadata")
                    .with_details(format!("{ctx}; err={e}"))
            })?;
            &parsed
        }
        other => other,
    };
    let items = list.as_array().ok_or_else(|| {
        AppError::malformed("index_metadata must be a list of block markers")
            .with_details(ctx.to_string())
    })?;

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_ctx = format!("{ctx}; marker={i}");
        let obj = item.as_object().ok_or_else(|| {
            AppError::malformed("Block marker must be an object").with_details(item_ctx.clone())
        })?;
        let key_raw = field(obj, fields.block_id_key, &item_ctx)?;
        let key = block_key(content_type, key_raw).ok_or_else(|| {
            AppError::malformed("Block marker identifier is invalid for its content type")
                .with_details(format!(
                    "{item_ctx}; {}={key_raw}",
                    fields.block_id_key
                ))
        })?;
        out.push(BlockMarker {
            key,
            char_start: index_field(obj, "char_start", &item_ctx)?,
        });
    }
    Ok(out)
}

/// Decode one search hit (`{"text": ..., "metadata": {...}, "index_metadata": ...}`).
///
/// `index_metadata` is read from the hit itself, falling back to `metadata.index_metadata`.
pub fn decode_search_hit(hit: &Value) -> Result<Passage, AppError> {
    let obj = hit.as_object().ok_or_else(|| {
        AppError::malformed("Search hit must be an object")
    })?;
    let text = str_field(obj, "text", "hit")?;
    let meta = field(obj, "metadata", "hit")?.as_object().ok_or_else(|| {
        AppError::malformed("Search hit metadata must be an object")
    })?;

    let content_type = ContentType::parse(str_field(meta, "content_type", "metadata")?)?;
    let fields = hit_fields(content_type);
    let url = str_field(meta, fields.url_key, "metadata")?;
    let ctx = format!("url={url}");
    let title = str_field(meta, fields.title_key, &ctx)?;
    let start_index = index_field(meta, "start_index", &ctx)?;
    let contextual_header = str_field(meta, "contextual_header", &ctx)?;

    let raw_markers = match obj.get("index_metadata").filter(|v| !v.is_null()) {
        Some(v) => v,
        None => field(meta, "index_metadata", &ctx)?,
    };
    let markers = decode_markers(raw_markers, content_type, fields, &ctx)?;

    Ok(Passage {
        url: url.to_string(),
        title: title.to_string(),
        content_type,
        text: text.to_string(),
        start_index,
        markers,
        contextual_header: contextual_header.to_string(),
    })
}

/// Decode a JSON array of search hits, failing on the first malformed one.
pub fn decode_search_hits(raw_json: &str) -> Result<Vec<Passage>, AppError> {
    let v: Value = serde_json::from_str(raw_json).map_err(|e| {
        AppError::malformed("Failed to decode search hits").with_details(e.to_string())
    })?;
    let hits = v.as_array().ok_or_else(|| {
        AppError::malformed("Search hits must be a JSON array")
    })?;
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            decode_search_hit(hit).map_err(|e| {
                let details = match e.details {
                    Some(d) => format!("hit={i}; {d}"),
                    None => format!("hit={i}"),
                };
                AppError {
                    details: Some(details),
                    ..e
                }
            })
        })
        .collect()
}
