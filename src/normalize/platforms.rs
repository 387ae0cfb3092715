//! Canonical per-platform content.
//!
//! Every field except the canonical sequence or text is optional: a
//! missing or mistyped value decodes to its empty default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::decode;

/// Decode only the object entries of a sequence, skipping everything else
fn object_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryFrame {
    #[serde(deserialize_with = "decode::lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(deserialize_with = "decode::lenient_string")]
    pub text: String,
    #[serde(
        alias = "visualPrompt",
        deserialize_with = "decode::lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub visual_prompt: Option<String>,
    #[serde(
        alias = "imageUrl",
        deserialize_with = "decode::lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
}

/// How a story links out; sent either as a bare label or as an object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LinkStrategyWire")]
pub struct LinkStrategy {
    pub approach: Option<String>,
    pub url: Option<String>,
    pub cta: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkStrategyWire {
    Label(String),
    Detailed {
        #[serde(default, alias = "type", alias = "strategy", deserialize_with = "decode::lenient_opt_string")]
        approach: Option<String>,
        #[serde(default, deserialize_with = "decode::lenient_opt_string")]
        url: Option<String>,
        #[serde(default, alias = "call_to_action", deserialize_with = "decode::lenient_opt_string")]
        cta: Option<String>,
    },
}

impl From<LinkStrategyWire> for LinkStrategy {
    fn from(wire: LinkStrategyWire) -> Self {
        match wire {
            LinkStrategyWire::Label(label) => LinkStrategy {
                approach: Some(label),
                ..LinkStrategy::default()
            },
            LinkStrategyWire::Detailed { approach, url, cta } => LinkStrategy { approach, url, cta },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stickers {
    #[serde(
        alias = "linkStrategy",
        deserialize_with = "decode::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub link_strategy: Option<LinkStrategy>,
    #[serde(alias = "stickerIdeas", deserialize_with = "decode::lenient_seq")]
    pub sticker_ideas: Vec<String>,
}

/// One compliance check; a bare string is a check with unknown outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ComplianceCheckWire")]
pub struct ComplianceCheck {
    pub rule: String,
    pub passed: Option<bool>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ComplianceCheckWire {
    Label(String),
    Detailed {
        #[serde(default, alias = "name", alias = "check", deserialize_with = "decode::lenient_string")]
        rule: String,
        #[serde(default, alias = "ok", alias = "pass", deserialize_with = "decode::lenient")]
        passed: Option<bool>,
        #[serde(default, alias = "notes", deserialize_with = "decode::lenient_opt_string")]
        note: Option<String>,
    },
}

impl From<ComplianceCheckWire> for ComplianceCheck {
    fn from(wire: ComplianceCheckWire) -> Self {
        match wire {
            ComplianceCheckWire::Label(rule) => ComplianceCheck {
                rule,
                ..ComplianceCheck::default()
            },
            ComplianceCheckWire::Detailed { rule, passed, note } => ComplianceCheck { rule, passed, note },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compliance {
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub checks: Vec<ComplianceCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryContent {
    #[serde(deserialize_with = "object_entries")]
    pub frames: Vec<StoryFrame>,
    #[serde(deserialize_with = "decode::lenient")]
    pub stickers: Stickers,
    #[serde(alias = "overlayHashtags", deserialize_with = "decode::lenient_seq")]
    pub overlay_hashtags: Vec<String>,
    #[serde(deserialize_with = "decode::lenient")]
    pub compliance: Compliance,
    #[serde(deserialize_with = "decode::lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slide {
    #[serde(deserialize_with = "decode::lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(alias = "text", deserialize_with = "decode::lenient_string")]
    pub body: String,
    #[serde(
        alias = "visualPrompt",
        deserialize_with = "decode::lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub visual_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselContent {
    #[serde(deserialize_with = "object_entries")]
    pub slides: Vec<Slide>,
    #[serde(deserialize_with = "decode::lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tweet {
    #[serde(alias = "content", deserialize_with = "decode::lenient_string")]
    pub text: String,
    #[serde(deserialize_with = "decode::lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadContent {
    #[serde(deserialize_with = "object_entries")]
    pub tweets: Vec<Tweet>,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostContent {
    /// Main text, taken from `body`, `caption` or `text` in that order
    pub text: String,
    #[serde(
        alias = "headline",
        deserialize_with = "decode::lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub hashtags: Vec<String>,
    #[serde(
        alias = "callToAction",
        alias = "cta",
        deserialize_with = "decode::lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub call_to_action: Option<String>,
}

/// Renderable content of one result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedContent {
    Story(StoryContent),
    Carousel(CarouselContent),
    Thread(ThreadContent),
    Post(PostContent),
    Generic { fields: serde_json::Map<String, Value> },
    /// Payload that matched no known shape; kept verbatim for inspection
    Malformed { reason: String, raw: Value },
}

impl NormalizedContent {
    pub fn is_malformed(&self) -> bool {
        matches!(self, NormalizedContent::Malformed { .. })
    }
}
