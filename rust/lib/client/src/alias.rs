//! Field aliasing: the backend names the same field differently across
//! entity types and API versions. Each rule resolves a fixed fallback chain
//! onto one canonical key before the record is deserialized.

use serde_json::{Map, Value};

use crate::image::normalize_image;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    /// First non-empty string (or number) wins.
    Text,
    /// Truthy coercion across the chain: `a || b || false`.
    Flag,
    /// Like `Text`, then run through the image normalizer. Always present
    /// afterwards (placeholder when the chain is empty).
    Image,
}

#[derive(Debug, Clone, Copy)]
pub struct AliasRule {
    pub canonical: &'static str,
    pub sources: &'static [&'static str],
    pub kind: AliasKind,
}

impl AliasRule {
    pub const fn text(canonical: &'static str, sources: &'static [&'static str]) -> Self {
        Self { canonical, sources, kind: AliasKind::Text }
    }

    pub const fn flag(canonical: &'static str, sources: &'static [&'static str]) -> Self {
        Self { canonical, sources, kind: AliasKind::Flag }
    }

    pub const fn image(canonical: &'static str, sources: &'static [&'static str]) -> Self {
        Self { canonical, sources, kind: AliasKind::Image }
    }
}

pub const TITLE: AliasRule = AliasRule::text("title", &["title", "name"]);
pub const STATUS: AliasRule = AliasRule::text("status", &["status", "level"]);
pub const FEATURED: AliasRule = AliasRule::flag("featured", &["featured", "isFeatured", "isFavorite"]);
pub const IMAGE: AliasRule =
    AliasRule::image("image", &["image", "coverImageUrl", "imageBase64", "iconUrl"]);

/// Rules shared by every entity.
pub const COMMON: &[AliasRule] = &[TITLE, STATUS, FEATURED, IMAGE];

/// Apply `rules` in order to `record`, writing each canonical key.
pub fn apply(record: &mut Map<String, Value>, rules: &[AliasRule]) {
    for rule in rules {
        match rule.kind {
            AliasKind::Text => {
                if let Some(value) = first_text(record, rule.sources) {
                    record.insert(rule.canonical.to_string(), value);
                }
            }
            AliasKind::Flag => {
                let flag = rule
                    .sources
                    .iter()
                    .filter_map(|k| record.get(*k))
                    .any(truthy);
                record.insert(rule.canonical.to_string(), Value::Bool(flag));
            }
            AliasKind::Image => {
                let raw = first_text(record, rule.sources)
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                record.insert(rule.canonical.to_string(), Value::String(normalize_image(&raw)));
            }
        }
    }
}

fn first_text(record: &Map<String, Value>, sources: &[&str]) -> Option<Value> {
    sources
        .iter()
        .filter_map(|k| record.get(*k))
        .find(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(_) => true,
            _ => false,
        })
        .cloned()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}
