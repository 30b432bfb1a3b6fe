//! Forgiving field decoders for backend records.
//!
//! Every field is optional on the wire and may arrive as `null`, as a
//! number where a string is expected, or as a CSV string where a list is
//! expected.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Record id: string or number; blank reads as absent.
pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).filter(|s| !s.trim().is_empty()))
}

/// Text field; `null` and non-scalars read as empty.
pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
}

/// Optional text; blank reads as absent.
pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).filter(|s| !s.trim().is_empty()))
}

/// Boolean that also accepts `"true"`, `"1"` and non-zero numbers.
pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// String list from a JSON array or a comma-separated string.
pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(scalar_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => split_csv(&s),
        _ => Vec::new(),
    })
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write a list back as `"a, b, c"`.
pub fn join_csv<S: Serializer>(items: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Probe {
        #[serde(default, deserialize_with = "id")]
        id: Option<String>,
        #[serde(default, deserialize_with = "text")]
        name: String,
        #[serde(default, deserialize_with = "flag")]
        on: bool,
        #[serde(default, deserialize_with = "list", serialize_with = "join_csv")]
        tags: Vec<String>,
    }

    fn probe(value: serde_json::Value) -> Probe {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        assert_eq!(probe(json!({"id": 7})).id.as_deref(), Some("7"));
        assert_eq!(probe(json!({"id": "a-1"})).id.as_deref(), Some("a-1"));
        assert_eq!(probe(json!({"id": null})).id, None);
        assert_eq!(probe(json!({"id": " "})).id, None);
        assert_eq!(probe(json!({})).id, None);
    }

    #[test]
    fn null_text_is_empty() {
        assert_eq!(probe(json!({"name": null})).name, "");
        assert_eq!(probe(json!({"name": 3})).name, "3");
    }

    #[test]
    fn flags_coerce() {
        assert!(probe(json!({"on": "true"})).on);
        assert!(probe(json!({"on": 1})).on);
        assert!(!probe(json!({"on": "no"})).on);
        assert!(!probe(json!({"on": null})).on);
    }

    #[test]
    fn lists_accept_array_or_csv() {
        let expected = vec!["Rust".to_string(), "Tokio".to_string()];
        assert_eq!(probe(json!({"tags": ["Rust", " Tokio "]})).tags, expected);
        assert_eq!(probe(json!({"tags": "Rust, Tokio,"})).tags, expected);
        assert!(probe(json!({"tags": null})).tags.is_empty());
    }

    #[test]
    fn lists_serialize_as_csv() {
        let value = serde_json::to_value(probe(json!({"tags": ["a", "b"]}))).unwrap();
        assert_eq!(value["tags"], "a, b");
    }
}
