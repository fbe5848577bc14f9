//! The conflicts view: a map function over documents with unresolved
//! conflicting revisions.
//!
//! For every document whose `_conflicts` field is set, the view emits one
//! entry keyed by `entity.name` (or a null key) whose value is the raw
//! `_conflicts` list. Emissions go to an explicit [`Emitter`] rather than an
//! ambient host function.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::document::{self, FIELD_CONFLICTS, FIELD_ENTITY, FIELD_NAME};

/// Name under which the view is registered in its design document.
pub const VIEW_NAME: &str = "conflicts";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single `(key, value)` emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// `entity.name` of the source document, or `None` for a null key.
    pub key: Option<String>,
    /// The document's `_conflicts` value, unmodified.
    pub value: Value,
}

/// Sink that collects emissions from a map function.
pub trait Emitter {
    fn emit(&mut self, key: Option<String>, value: Value);
}

impl<F> Emitter for F
where
    F: FnMut(Option<String>, Value),
{
    fn emit(&mut self, key: Option<String>, value: Value) {
        self(key, value)
    }
}

impl Emitter for Vec<IndexEntry> {
    fn emit(&mut self, key: Option<String>, value: Value) {
        self.push(IndexEntry { key, value });
    }
}

/// A per-document map function, invoked once per document by an indexer.
pub trait MapFunction {
    /// The view name this function is registered under.
    fn name(&self) -> &str;

    /// Map one document, emitting zero or more entries.
    fn map(&self, doc: &Value, emitter: &mut dyn Emitter);
}

// ---------------------------------------------------------------------------
// Conflicts view
// ---------------------------------------------------------------------------

/// Stateless map function indexing conflicted documents by entity name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictsView;

impl ConflictsView {
    /// Project a document to its index entry.
    ///
    /// Returns `None` when `_conflicts` is absent or falsy (an empty list
    /// counts as falsy). The key falls back to `None` whenever `entity` is
    /// missing, is not an object, or has no non-empty string `name`.
    pub fn index(doc: &Value) -> Option<IndexEntry> {
        let conflicts = document::lookup(doc, &[FIELD_CONFLICTS])?;
        if !document::is_truthy(conflicts) {
            return None;
        }

        Some(IndexEntry {
            key: entity_name(doc),
            value: conflicts.clone(),
        })
    }
}

impl MapFunction for ConflictsView {
    fn name(&self) -> &str {
        VIEW_NAME
    }

    fn map(&self, doc: &Value, emitter: &mut dyn Emitter) {
        if let Some(entry) = Self::index(doc) {
            trace!(
                doc_id = document::document_id(doc).unwrap_or("-"),
                key = entry.key.as_deref().unwrap_or("null"),
                conflicts = entry.value.as_array().map_or(0, Vec::len),
                "emitting conflict entry"
            );
            emitter.emit(entry.key, entry.value);
        }
    }
}

fn entity_name(doc: &Value) -> Option<String> {
    document::lookup(doc, &[FIELD_ENTITY, FIELD_NAME])
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_document() {
        let doc = json!({"_conflicts": ["1-abc", "2-def"], "entity": {"name": "widget-1"}});
        let entry = ConflictsView::index(&doc).expect("entry");
        assert_eq!(entry.key.as_deref(), Some("widget-1"));
        assert_eq!(entry.value, json!(["1-abc", "2-def"]));
    }

    #[test]
    fn test_missing_entity_gives_null_key() {
        let doc = json!({"_conflicts": ["1-abc"]});
        let entry = ConflictsView::index(&doc).expect("entry");
        assert_eq!(entry.key, None);
        assert_eq!(entry.value, json!(["1-abc"]));
    }

    #[test]
    fn test_entity_without_name_gives_null_key() {
        let doc = json!({"_conflicts": ["1-abc"], "entity": {"kind": "widget"}});
        assert_eq!(ConflictsView::index(&doc).unwrap().key, None);
    }

    #[test]
    fn test_no_conflicts_emits_nothing() {
        let doc = json!({"entity": {"name": "widget-1"}});
        assert_eq!(ConflictsView::index(&doc), None);

        let doc = json!({"_conflicts": null, "entity": {"name": "widget-1"}});
        assert_eq!(ConflictsView::index(&doc), None);
    }

    #[test]
    fn test_empty_conflicts_emits_nothing() {
        let doc = json!({"_conflicts": [], "entity": {"name": "x"}});
        assert_eq!(ConflictsView::index(&doc), None);
    }

    #[test]
    fn test_malformed_entity_degrades_to_null_key() {
        for entity in [json!("widget"), json!(42), json!(["a"]), json!(null)] {
            let doc = json!({"_conflicts": ["1-a"], "entity": entity});
            assert_eq!(ConflictsView::index(&doc).unwrap().key, None);
        }
    }

    #[test]
    fn test_non_string_or_empty_name_degrades_to_null_key() {
        for name in [json!(7), json!(true), json!({"first": "a"}), json!("")] {
            let doc = json!({"_conflicts": ["1-a"], "entity": {"name": name}});
            assert_eq!(ConflictsView::index(&doc).unwrap().key, None);
        }
    }

    #[test]
    fn test_non_sequence_conflicts_passed_through_raw() {
        let doc = json!({"_conflicts": "1-abc", "entity": {"name": "w"}});
        let entry = ConflictsView::index(&doc).unwrap();
        assert_eq!(entry.value, json!("1-abc"));
    }

    #[test]
    fn test_non_object_document_emits_nothing() {
        assert_eq!(ConflictsView::index(&json!(null)), None);
        assert_eq!(ConflictsView::index(&json!("doc")), None);
        assert_eq!(ConflictsView::index(&json!([1, 2])), None);
    }

    #[test]
    fn test_index_is_idempotent() {
        let doc = json!({"_conflicts": ["3-c", "2-b"], "entity": {"name": "alice"}});
        assert_eq!(ConflictsView::index(&doc), ConflictsView::index(&doc));
    }

    #[test]
    fn test_map_emits_at_most_once() {
        let view = ConflictsView;
        let mut entries: Vec<IndexEntry> = Vec::new();

        view.map(&json!({"_conflicts": ["1-a"], "entity": {"name": "alice"}}), &mut entries);
        view.map(&json!({"entity": {"name": "bob"}}), &mut entries);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key.as_deref(), Some("alice"));
    }

    #[test]
    fn test_map_with_closure_emitter() {
        let mut calls = 0;
        let mut sink = |key: Option<String>, value: Value| {
            calls += 1;
            assert_eq!(key, None);
            assert_eq!(value, json!(["1-a", "1-b"]));
        };
        ConflictsView.map(&json!({"_conflicts": ["1-a", "1-b"]}), &mut sink);
        assert_eq!(calls, 1);
        assert_eq!(ConflictsView.name(), "conflicts");
    }
}
