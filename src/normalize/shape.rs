use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Content family of a `(platform, format)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Story,
    Carousel,
    Thread,
    Post,
    Generic,
}

impl ContentKind {
    /// Resolve from the result's format, falling back to the platform suffix
    /// (`instagram-story` → story) when the format is blank
    pub fn detect(platform: &str, format: &str) -> Self {
        let format = format.trim();
        let name = if format.is_empty() {
            platform.rsplit('-').next().unwrap_or_default()
        } else {
            format
        };

        match name.to_ascii_lowercase().as_str() {
            "story" | "stories" => ContentKind::Story,
            "carousel" => ContentKind::Carousel,
            "thread" => ContentKind::Thread,
            "post" | "article" => ContentKind::Post,
            _ => ContentKind::Generic,
        }
    }

    /// Keys whose presence identifies this kind's content object
    pub fn canonical_keys(&self) -> &'static [&'static str] {
        match self {
            ContentKind::Story => &["frames"],
            ContentKind::Carousel => &["slides"],
            ContentKind::Thread => &["tweets"],
            ContentKind::Post => &["body", "caption", "text"],
            ContentKind::Generic => &[],
        }
    }

    /// First canonical key present in `map`
    pub fn canonical_key_in(&self, map: &Map<String, Value>) -> Option<&'static str> {
        self.canonical_keys()
            .iter()
            .copied()
            .find(|key| map.contains_key(*key))
    }

    fn identifies(&self, map: &Map<String, Value>) -> bool {
        match self {
            ContentKind::Generic => !is_wrapper(map),
            _ => self.canonical_key_in(map).is_some(),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Story => "story",
            ContentKind::Carousel => "carousel",
            ContentKind::Thread => "thread",
            ContentKind::Post => "post",
            ContentKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Where a payload keeps its content object
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    /// Canonical keys sit at the top level
    Bare(&'a Map<String, Value>),
    /// Canonical keys sit under `content`, with an optional sibling `meta`
    Wrapped {
        meta: Option<&'a Value>,
        content: &'a Map<String, Value>,
    },
    Unrecognized,
}

impl<'a> Shape<'a> {
    /// Classify `payload` for `kind`, descending into `content` at most once
    pub fn detect(kind: ContentKind, payload: &'a Value) -> Self {
        let Value::Object(outer) = payload else {
            return Shape::Unrecognized;
        };

        if kind.identifies(outer) {
            return Shape::Bare(outer);
        }

        match outer.get("content") {
            Some(Value::Object(inner)) if kind == ContentKind::Generic || kind.identifies(inner) => {
                Shape::Wrapped {
                    meta: outer.get("meta").filter(|meta| !meta.is_null()),
                    content: inner,
                }
            }
            _ => Shape::Unrecognized,
        }
    }

    pub fn content(&self) -> Option<&'a Map<String, Value>> {
        match self {
            Shape::Bare(content) => Some(content),
            Shape::Wrapped { content, .. } => Some(content),
            Shape::Unrecognized => None,
        }
    }
}

/// `{content: {...}}` optionally alongside `meta`, and nothing else
fn is_wrapper(map: &Map<String, Value>) -> bool {
    matches!(map.get("content"), Some(Value::Object(_)))
        && map.keys().all(|key| key == "content" || key == "meta")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_from_format_or_platform() {
        assert_eq!(ContentKind::detect("instagram", "story"), ContentKind::Story);
        assert_eq!(ContentKind::detect("instagram-story", ""), ContentKind::Story);
        assert_eq!(ContentKind::detect("instagram", "Carousel"), ContentKind::Carousel);
        assert_eq!(ContentKind::detect("x", "thread"), ContentKind::Thread);
        assert_eq!(ContentKind::detect("linkedin", "article"), ContentKind::Post);
        assert_eq!(ContentKind::detect("youtube", "script"), ContentKind::Generic);
    }

    #[test]
    fn bare_and_wrapped_story() {
        let bare = json!({"frames": []});
        assert!(matches!(Shape::detect(ContentKind::Story, &bare), Shape::Bare(_)));

        let wrapped = json!({"meta": {"model": "m1"}, "content": {"frames": []}});
        let Shape::Wrapped { meta, content } = Shape::detect(ContentKind::Story, &wrapped) else {
            panic!("expected wrapped shape");
        };
        assert_eq!(meta, Some(&json!({"model": "m1"})));
        assert!(content.contains_key("frames"));
    }

    #[test]
    fn descends_only_once() {
        let nested = json!({"content": {"content": {"frames": []}}});
        assert_eq!(Shape::detect(ContentKind::Story, &nested), Shape::Unrecognized);
    }

    #[test]
    fn unrecognized_payloads() {
        assert_eq!(Shape::detect(ContentKind::Story, &json!(null)), Shape::Unrecognized);
        assert_eq!(Shape::detect(ContentKind::Story, &json!([1, 2])), Shape::Unrecognized);
        assert_eq!(
            Shape::detect(ContentKind::Carousel, &json!({"frames": []})),
            Shape::Unrecognized
        );
    }

    #[test]
    fn post_accepts_any_text_key() {
        for payload in [json!({"body": "x"}), json!({"caption": "x"}), json!({"text": "x"})] {
            assert!(matches!(Shape::detect(ContentKind::Post, &payload), Shape::Bare(_)));
        }
    }

    #[test]
    fn generic_unwraps_pure_wrapper_only() {
        let wrapped = json!({"meta": {}, "content": {"script": "hi"}});
        assert!(matches!(
            Shape::detect(ContentKind::Generic, &wrapped),
            Shape::Wrapped { .. }
        ));

        let bare = json!({"script": "hi", "content": {"a": 1}});
        assert!(matches!(Shape::detect(ContentKind::Generic, &bare), Shape::Bare(_)));
    }
}
