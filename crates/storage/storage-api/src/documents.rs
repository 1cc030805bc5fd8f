//! The document boundary.
//!
//! The engine core treats documents as opaque length-prefixed byte blobs
//! and deliberately owns no document encoding. It consumes exactly three
//! operations from this module. This is the one concrete implementation
//! of that boundary, backed by JSON, provided so the crate is runnable
//! and testable end-to-end; a different document encoding only needs to
//! reimplement this one small module.

use serde_json::Value;

/// A cheap, non-owning accessor over a document's fields.
pub struct DocumentView<'a> {
    value: &'a Value,
}

impl<'a> DocumentView<'a> {
    /// Reads back the `_id` field as a JSON value, if present.
    pub fn id(&self) -> Option<&Value> {
        self.value.get("_id")
    }

    /// Reads an arbitrary top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }
}

/// The document's own notion of its byte size; for the JSON encoding this
/// is simply the length of its serialized bytes.
pub fn objsize(bytes: &[u8]) -> usize {
    bytes.len()
}

/// Whether `bytes` parses as a JSON object with a top-level field named
/// `name`.
pub fn has_top_level_field(bytes: &[u8], name: &str) -> bool {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map.contains_key(name),
        _ => false,
    }
}

/// Parses `bytes` into a borrowing [`DocumentView`]. Returns `None` if
/// `bytes` is not valid JSON.
pub fn as_view(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice::<Value>(bytes).ok()
}

pub fn view(value: &Value) -> DocumentView<'_> {
    DocumentView { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_top_level_field_detects_id() {
        let doc = serde_json::to_vec(&serde_json::json!({"_id": "abc", "x": 1})).unwrap();
        assert!(has_top_level_field(&doc, "_id"));
        assert!(!has_top_level_field(&doc, "missing"));
    }

    #[test]
    fn non_json_bytes_have_no_top_level_field() {
        assert!(!has_top_level_field(b"not json", "_id"));
    }

    #[test]
    fn view_reads_id_back() {
        let doc = serde_json::to_vec(&serde_json::json!({"_id": "abc"})).unwrap();
        let value = as_view(&doc).unwrap();
        let view = view(&value);
        assert_eq!(view.id().unwrap(), "abc");
    }

    #[test]
    fn objsize_is_byte_length() {
        let doc = serde_json::to_vec(&serde_json::json!({"_id": 1})).unwrap();
        assert_eq!(objsize(&doc), doc.len());
    }
}
