//! In-memory view index.
//!
//! Plays the part of the store's indexing engine: every document is handed
//! to a [`MapFunction`] once and the emissions are collected into rows
//! labelled with the source document id, ordered by key.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::document;
use crate::view::{IndexEntry, MapFunction};

/// One row of a view: an emission plus the id of the document behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub id: String,
    pub key: Option<String>,
    pub value: Value,
}

impl ViewRow {
    /// The row as the store's view endpoint returns it.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "key": self.key,
            "value": self.value,
        })
    }

    /// Read a row from a view query result returned by the store.
    pub fn from_json(row: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(row)
    }
}

/// Rows produced by running a map function over a set of documents.
#[derive(Debug, Clone, Default)]
pub struct ViewIndex {
    view_name: String,
    rows: Vec<ViewRow>,
}

impl ViewIndex {
    /// Run `map` over every document and collect the sorted rows.
    ///
    /// Documents that emit but carry no string `_id` are skipped, since
    /// their rows could not be traced back to a document.
    pub fn build<'a, M, I>(map: &M, docs: I) -> Self
    where
        M: MapFunction + ?Sized,
        I: IntoIterator<Item = &'a Value>,
    {
        let mut rows = Vec::new();
        let mut seen = 0usize;
        let mut skipped = 0usize;

        for doc in docs {
            seen += 1;
            let mut emitted: Vec<IndexEntry> = Vec::new();
            map.map(doc, &mut emitted);
            if emitted.is_empty() {
                continue;
            }

            let Some(id) = document::document_id(doc) else {
                warn!(view = map.name(), "skipping emission from document without _id");
                skipped += 1;
                continue;
            };

            rows.extend(emitted.into_iter().map(|entry| ViewRow {
                id: id.to_string(),
                key: entry.key,
                value: entry.value,
            }));
        }

        // Null keys collate before strings; ties fall back to document id.
        rows.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.id.cmp(&b.id)));

        info!(
            view = map.name(),
            documents = seen,
            rows = rows.len(),
            skipped,
            "view index built"
        );

        Self {
            view_name: map.name().to_string(),
            rows,
        }
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose key equals `key`; `None` selects the null-key rows.
    pub fn rows_for_key<'a>(
        &'a self,
        key: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ViewRow> + 'a {
        let start = self.rows.partition_point(|row| row.key.as_deref() < key);
        debug!(view = %self.view_name, key = key.unwrap_or("null"), start, "querying view");
        self.rows[start..]
            .iter()
            .take_while(move |row| row.key.as_deref() == key)
    }

    /// All rows in the JSON form a view query returns.
    pub fn json_rows(&self) -> Vec<Value> {
        self.rows.iter().map(ViewRow::to_json).collect()
    }

    /// `{"total_rows", "offset", "rows"}` result of an unfiltered query.
    pub fn to_query_result(&self) -> Value {
        json!({
            "total_rows": self.rows.len(),
            "offset": 0,
            "rows": self.json_rows(),
        })
    }
}
