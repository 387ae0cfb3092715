//! Result normalization.
//!
//! Generated results arrive in several envelope layouts. The content may
//! sit directly under `envelope.content` (bare) or one level deeper as
//! `{meta, content}` (wrapped), and may even be JSON-encoded text. This
//! module resolves the layout once with [`Shape`] and decodes the content
//! into one [`NormalizedContent`] variant per [`ContentKind`].
//!
//! Normalization never fails: payloads that match no known layout become
//! [`NormalizedContent::Malformed`] with the reason and the raw value.

pub mod platforms;
pub mod shape;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::ContentResult;

pub use platforms::{
    CarouselContent, Compliance, ComplianceCheck, LinkStrategy, NormalizedContent, PostContent,
    Slide, Stickers, StoryContent, StoryFrame, ThreadContent, Tweet,
};
pub use shape::{ContentKind, Shape};

/// One result in renderable form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub job_id: String,
    pub platform: String,
    pub format: String,
    pub kind: ContentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    pub content: NormalizedContent,
}

impl NormalizedResult {
    pub fn is_malformed(&self) -> bool {
        self.content.is_malformed()
    }
}

pub fn normalize(result: &ContentResult) -> NormalizedResult {
    let kind = ContentKind::detect(&result.platform, &result.format);
    let envelope_meta = result.envelope.get("meta").filter(|meta| !meta.is_null());

    let payload = match result.envelope.get("content") {
        Some(Value::String(text)) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())),
        Some(content) => content.clone(),
        None => Value::Null,
    };

    let (meta, content) = match Shape::detect(kind, &payload) {
        Shape::Bare(content) => (envelope_meta.cloned(), decode_content(kind, content, &payload)),
        Shape::Wrapped { meta, content } => (
            meta.or(envelope_meta).cloned(),
            decode_content(kind, content, &payload),
        ),
        Shape::Unrecognized => (envelope_meta.cloned(), unrecognized(kind, &payload)),
    };

    NormalizedResult {
        job_id: result.job_id.clone(),
        platform: result.platform.clone(),
        format: result.format.clone(),
        kind,
        meta,
        content,
    }
}

/// Normalize every result, preserving order
pub fn normalize_all(results: &[ContentResult]) -> Vec<NormalizedResult> {
    results.iter().map(normalize).collect()
}

fn decode_content(kind: ContentKind, content: &Map<String, Value>, raw: &Value) -> NormalizedContent {
    let decoded = match kind {
        ContentKind::Story => require_array(content, "frames")
            .and_then(|_| decode(content))
            .map(NormalizedContent::Story),
        ContentKind::Carousel => require_array(content, "slides")
            .and_then(|_| decode(content))
            .map(NormalizedContent::Carousel),
        ContentKind::Thread => require_array(content, "tweets")
            .and_then(|_| decode(content))
            .map(NormalizedContent::Thread),
        ContentKind::Post => decode_post(content).map(NormalizedContent::Post),
        ContentKind::Generic => Ok(NormalizedContent::Generic {
            fields: content.clone(),
        }),
    };

    decoded.unwrap_or_else(|reason| NormalizedContent::Malformed {
        reason,
        raw: raw.clone(),
    })
}

fn decode_post(content: &Map<String, Value>) -> Result<PostContent, String> {
    let key = ContentKind::Post
        .canonical_key_in(content)
        .ok_or_else(|| "post has no body, caption or text".to_string())?;

    let text = match content.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => return Err(format!("`{}` must be a string, got {}", key, type_name(other))),
        None => String::new(),
    };

    let mut post: PostContent = decode(content)?;
    post.text = text;
    Ok(post)
}

fn require_array(content: &Map<String, Value>, key: &str) -> Result<(), String> {
    match content.get(key) {
        Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(format!("`{}` must be an array, got {}", key, type_name(other))),
        None => Err(format!("missing `{}`", key)),
    }
}

fn decode<T: DeserializeOwned>(content: &Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(content.clone())).map_err(|e| e.to_string())
}

fn unrecognized(kind: ContentKind, payload: &Value) -> NormalizedContent {
    let reason = match payload {
        Value::Null => "envelope has no content".to_string(),
        Value::Object(_) => format!(
            "no {} found at top level or under `content`",
            kind.canonical_keys()
                .iter()
                .map(|key| format!("`{}`", key))
                .collect::<Vec<_>>()
                .join(" or ")
        ),
        other => format!("content must be an object, got {}", type_name(other)),
    };

    NormalizedContent::Malformed {
        reason,
        raw: payload.clone(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
