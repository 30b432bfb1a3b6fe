//! Response-shape resolution.
//!
//! The backend wraps "a list of records" in at least five different ways.
//! A body is classified once, in a fixed order (first match wins), and then
//! extracted into one stable envelope. Every adapter goes through here.

use serde_json::{Map, Value};
use tracing::warn;

const TOTAL_PAGES_KEYS: &[&str] = &["totalPages", "total_pages"];
const TOTAL_ITEMS_KEYS: &[&str] = &["totalItems", "totalCount", "total"];

/// Which envelope a list body arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// `[...]`
    BareArray,
    /// `{data: [...]}`
    Data,
    /// `{data: {data: [...], totalPages}}`
    NestedData,
    /// `{data: {items: [...]}}`
    DataItems,
    /// `{items: [...]}`
    Items,
    /// `{result: [...]}`
    Result,
    /// No list anywhere in the body.
    Unrecognized,
}

/// A classified body: the list plus whatever paging hints sat next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawList<'a> {
    pub shape: ListShape,
    pub items: &'a [Value],
    pub total_pages: Option<u64>,
    pub total_items: Option<u64>,
}

/// Classify a list body. Resolution order:
/// bare array → `.data[]` → `.data.data[]` → `.data.items[]` → `.items[]`
/// → `.result[]` → unrecognized.
pub fn classify(body: &Value) -> RawList<'_> {
    if let Value::Array(items) = body {
        return RawList::bare(items);
    }

    let Some(root) = body.as_object() else {
        return RawList::unrecognized();
    };

    match root.get("data") {
        Some(Value::Array(items)) => return RawList::from_container(ListShape::Data, items, root),
        Some(Value::Object(data)) => {
            if let Some(Value::Array(items)) = data.get("data") {
                return RawList::from_container(ListShape::NestedData, items, data).or_paging(root);
            }
            if let Some(Value::Array(items)) = data.get("items") {
                return RawList::from_container(ListShape::DataItems, items, data).or_paging(root);
            }
        }
        _ => {}
    }

    if let Some(Value::Array(items)) = root.get("items") {
        return RawList::from_container(ListShape::Items, items, root);
    }
    if let Some(Value::Array(items)) = root.get("result") {
        return RawList::from_container(ListShape::Result, items, root);
    }

    RawList::unrecognized()
}

impl<'a> RawList<'a> {
    fn bare(items: &'a [Value]) -> Self {
        Self {
            shape: ListShape::BareArray,
            items,
            total_pages: None,
            total_items: None,
        }
    }

    fn unrecognized() -> Self {
        Self {
            shape: ListShape::Unrecognized,
            items: &[],
            total_pages: None,
            total_items: None,
        }
    }

    fn from_container(shape: ListShape, items: &'a [Value], container: &Map<String, Value>) -> Self {
        Self {
            shape,
            items,
            total_pages: count(container, TOTAL_PAGES_KEYS),
            total_items: count(container, TOTAL_ITEMS_KEYS),
        }
    }

    /// Fall back to paging hints on an outer object.
    fn or_paging(mut self, outer: &Map<String, Value>) -> Self {
        self.total_pages = self.total_pages.or_else(|| count(outer, TOTAL_PAGES_KEYS));
        self.total_items = self.total_items.or_else(|| count(outer, TOTAL_ITEMS_KEYS));
        self
    }

    /// Total page count for the envelope, never below 1.
    ///
    /// Explicit `totalPages` wins, then `totalItems / page_size` rounded up.
    /// Without either, assume another page exists only when this page came
    /// back full.
    pub fn total_pages(&self, page: u32, page_size: u32) -> u32 {
        let pages = match (self.total_pages, self.total_items) {
            (Some(pages), _) => pages,
            (None, Some(items)) if page_size > 0 => items.div_ceil(u64::from(page_size)),
            _ => {
                let full = page_size > 0 && self.items.len() >= page_size as usize;
                u64::from(page) + u64::from(full)
            }
        };
        pages.clamp(1, u64::from(u32::MAX)) as u32
    }
}

fn count(container: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().filter_map(|k| container.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// ── Normalized envelope ─────────────────────────────────────────────

/// The one list shape every view consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEnvelope<T> {
    pub items: Vec<T>,
    pub page: u32,
    /// Always `>= 1`.
    pub total_pages: u32,
    /// `false` when the body held no list at all. Lets a view tell "the
    /// backend answered with something unexpected" apart from a
    /// well-formed empty list.
    pub recognized: bool,
    /// Entries the body listed but that could not be read as records.
    /// Non-zero with empty `items` means "data the client could not read",
    /// not "no data".
    pub skipped: usize,
}

impl<T> ListEnvelope<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Resolve a list body into an envelope of raw JSON records.
pub fn resolve_list(body: &Value, page: u32, page_size: u32) -> ListEnvelope<Value> {
    let page = page.max(1);
    let raw = classify(body);
    if raw.shape == ListShape::Unrecognized {
        warn!("list response has no recognizable list; treating as empty");
    }
    ListEnvelope {
        items: raw.items.to_vec(),
        page,
        total_pages: raw.total_pages(page, page_size),
        recognized: raw.shape != ListShape::Unrecognized,
        skipped: 0,
    }
}

/// Members a response wraps around its payload. An object holding nothing
/// else carries no record.
const ENVELOPE_KEYS: &[&str] = &["status", "statusCode", "success", "message", "error"];

/// Unwrap a single-record body: an object under `data` wins, otherwise the
/// body itself when it is an object with record fields.
///
/// `None` when there is no record to decode: a non-object body, an empty
/// object, a `data` that is null or a list, or a bare status envelope.
pub fn unwrap_record(body: Value) -> Option<Map<String, Value>> {
    let Value::Object(mut map) = body else {
        return None;
    };
    let record = match map.remove("data") {
        Some(Value::Object(inner)) => inner,
        Some(Value::Null | Value::Array(_)) => return None,
        Some(other) => {
            map.insert("data".to_string(), other);
            map
        }
        None => map,
    };
    let has_fields = record.keys().any(|k| !ENVELOPE_KEYS.contains(&k.as_str()));
    has_fields.then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three() -> Value {
        json!([{"id": 1}, {"id": 2}, {"id": 3}])
    }

    #[test]
    fn five_envelopes_resolve_identically() {
        let bodies = [
            three(),
            json!({"data": three()}),
            json!({"data": {"data": three()}}),
            json!({"data": {"items": three()}}),
            json!({"result": three()}),
            json!({"items": three()}),
        ];
        let expected = resolve_list(&three(), 1, 10);
        assert_eq!(expected.items.len(), 3);
        assert_eq!(expected.total_pages, 1);
        for body in &bodies {
            assert_eq!(resolve_list(body, 1, 10), expected, "body {body}");
        }
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify(&three()).shape, ListShape::BareArray);
        assert_eq!(classify(&json!({"data": []})).shape, ListShape::Data);
        assert_eq!(classify(&json!({"data": {"data": []}})).shape, ListShape::NestedData);
        assert_eq!(classify(&json!({"data": {"items": []}})).shape, ListShape::DataItems);
        assert_eq!(classify(&json!({"items": []})).shape, ListShape::Items);
        assert_eq!(classify(&json!({"result": []})).shape, ListShape::Result);
        // `.data[]` wins over a sibling `.items[]`.
        assert_eq!(
            classify(&json!({"data": [1], "items": [1, 2]})).shape,
            ListShape::Data
        );
        // `.data.data[]` wins over `.data.items[]`.
        assert_eq!(
            classify(&json!({"data": {"data": [], "items": [1]}})).shape,
            ListShape::NestedData
        );
    }

    #[test]
    fn unrecognized_bodies() {
        for body in [
            json!(null),
            json!("ok"),
            json!({}),
            json!({"data": "nope"}),
            json!({"data": {"rows": []}}),
        ] {
            let env = resolve_list(&body, 1, 10);
            assert!(!env.recognized, "body {body}");
            assert!(env.items.is_empty());
            assert_eq!(env.total_pages, 1);
        }
    }

    #[test]
    fn well_formed_empty_list_is_recognized() {
        let env = resolve_list(&json!({"data": []}), 1, 10);
        assert!(env.recognized);
        assert!(env.is_empty());
    }

    #[test]
    fn nested_total_pages_is_used() {
        let body = json!({"data": {"data": [{"id": 1}, {"id": 2}], "totalPages": 5}});
        let env = resolve_list(&body, 1, 10);
        assert_eq!(env.items.len(), 2);
        assert_eq!(env.page, 1);
        assert_eq!(env.total_pages, 5);
        assert!(env.has_next());
    }

    #[test]
    fn total_items_is_divided_by_page_size() {
        let body = json!({"data": {"data": [{"id": 1}], "totalItems": 21}});
        assert_eq!(resolve_list(&body, 1, 10).total_pages, 3);

        let body = json!({"items": [], "totalCount": "20"});
        assert_eq!(resolve_list(&body, 1, 10).total_pages, 2);
    }

    #[test]
    fn outer_paging_hints_apply_to_nested_lists() {
        let body = json!({"data": {"items": [{"id": 1}]}, "totalPages": 4});
        assert_eq!(resolve_list(&body, 2, 1).total_pages, 4);
    }

    #[test]
    fn estimate_assumes_more_only_after_full_page() {
        let full = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(resolve_list(&full, 1, 2).total_pages, 2);
        assert_eq!(resolve_list(&full, 3, 2).total_pages, 4);

        let partial = json!([{"id": 1}]);
        assert_eq!(resolve_list(&partial, 1, 2).total_pages, 1);
        assert_eq!(resolve_list(&partial, 3, 2).total_pages, 3);
    }

    #[test]
    fn total_pages_never_below_one() {
        let body = json!({"data": {"data": [], "totalPages": 0}});
        assert_eq!(resolve_list(&body, 1, 10).total_pages, 1);
        assert_eq!(resolve_list(&json!([]), 0, 0).page, 1);
    }

    #[test]
    fn unwrap_record_prefers_data_object() {
        let inner = unwrap_record(json!({"status": 200, "data": {"id": 9}})).unwrap();
        assert_eq!(inner.get("id"), Some(&json!(9)));

        let bare = unwrap_record(json!({"id": 9, "title": "x"})).unwrap();
        assert_eq!(bare.get("title"), Some(&json!("x")));

        // A scalar `data` is just a field.
        let scalar = unwrap_record(json!({"id": 1, "data": "raw"})).unwrap();
        assert_eq!(scalar.get("data"), Some(&json!("raw")));

        assert!(unwrap_record(json!([1, 2])).is_none());
        assert!(unwrap_record(json!(null)).is_none());
    }

    #[test]
    fn bodies_without_a_record_unwrap_to_none() {
        for body in [
            json!({}),
            json!({"data": {}}),
            json!({"data": null}),
            json!({"data": []}),
            json!({"data": [{"id": 1}]}),
            json!({"status": 200, "data": null, "message": "not found"}),
            json!({"status": 200, "message": "ok"}),
            json!({"success": true, "data": {"message": "saved"}}),
        ] {
            assert!(unwrap_record(body.clone()).is_none(), "body {body}");
        }
    }
}
