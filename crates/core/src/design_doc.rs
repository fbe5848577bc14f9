//! The design document that registers the conflicts view with the store.
//!
//! The store executes map functions written in JavaScript, so the view body
//! is carried as source text. Its semantics mirror
//! [`ConflictsView`](crate::view::ConflictsView) exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DesignDocError;
use crate::view::VIEW_NAME;

/// Design document name (the `_id` is `_design/<name>`).
pub const DESIGN_DOC_NAME: &str = "conflicts";

/// Language the map source is written in.
pub const LANGUAGE: &str = "javascript";

/// Marker distinguishing a design document registration from user data.
pub const DOC_TYPE: &str = "design_document";

/// Schema version of this design document's own structure.
pub const SCHEMA_VERSION: u32 = 1;

/// JavaScript body of the conflicts view.
pub const CONFLICTS_MAP_SOURCE: &str = r#"function (doc) {
  var conflicts = doc._conflicts;
  if (!conflicts || (Array.isArray(conflicts) && conflicts.length === 0)) {
    return;
  }
  var name = null;
  if (doc.entity && typeof doc.entity === "object" &&
      typeof doc.entity.name === "string" && doc.entity.name) {
    name = doc.entity.name;
  }
  emit(name, conflicts);
}"#;

/// A single view registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Map function source.
    pub map: String,

    /// Optional reduce function source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

/// Registration record for the store's indexing subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub views: BTreeMap<String, ViewDefinition>,
}

fn default_language() -> String {
    LANGUAGE.into()
}
fn default_doc_type() -> String {
    DOC_TYPE.into()
}
fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// `_id` of the design document with the given name.
pub fn design_doc_id(name: &str) -> String {
    format!("_design/{}", name)
}

impl DesignDocument {
    /// The canonical design document declaring the `conflicts` view.
    pub fn conflicts() -> Self {
        Self::named(DESIGN_DOC_NAME, VIEW_NAME)
    }

    /// Design document `name` declaring the conflicts map under `view_name`.
    pub fn named(name: &str, view_name: &str) -> Self {
        let mut views = BTreeMap::new();
        views.insert(
            view_name.to_string(),
            ViewDefinition {
                map: CONFLICTS_MAP_SOURCE.to_string(),
                reduce: None,
            },
        );

        Self {
            id: design_doc_id(name),
            rev: None,
            language: default_language(),
            doc_type: default_doc_type(),
            version: SCHEMA_VERSION,
            views,
        }
    }

    /// Name part of the `_id` (everything after `_design/`).
    pub fn name(&self) -> &str {
        self.id.strip_prefix("_design/").unwrap_or(self.id.as_str())
    }

    /// Look up a view by name.
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    /// Check that `view_name` is declared with a non-empty map function.
    pub fn validate(&self, view_name: &str) -> Result<(), DesignDocError> {
        let view = self
            .view(view_name)
            .ok_or_else(|| DesignDocError::MissingView(view_name.to_string()))?;

        if view.map.trim().is_empty() {
            return Err(DesignDocError::EmptyMap(view_name.to_string()));
        }

        debug!(design_doc = %self.id, view = view_name, "design document validated");
        Ok(())
    }

    /// Check that this is design document `name` and that it declares
    /// `view_name`.
    pub fn validate_registration(&self, name: &str, view_name: &str) -> Result<(), DesignDocError> {
        if self.name() != name {
            return Err(DesignDocError::NameMismatch {
                expected: name.to_string(),
                found: self.id.clone(),
            });
        }
        self.validate(view_name)
    }

    /// Pretty-printed JSON, ready to be stored.
    pub fn to_json_pretty(&self) -> Result<String, DesignDocError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a design document as returned by the store.
    pub fn from_json(json: &str) -> Result<Self, DesignDocError> {
        Ok(serde_json::from_str(json)?)
    }
}
