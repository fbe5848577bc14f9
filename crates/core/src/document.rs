//! Safe field access over schemaless JSON documents.
//!
//! Documents reach the view as arbitrary `serde_json::Value`s. Everything
//! here treats a missing or wrongly-typed field as absent instead of failing.

use serde_json::Value;

/// Document identifier field.
pub const FIELD_ID: &str = "_id";
/// Conflicting revisions the store attaches to a document.
pub const FIELD_CONFLICTS: &str = "_conflicts";
/// Optional nested entity structure.
pub const FIELD_ENTITY: &str = "entity";
/// Name field inside `entity`.
pub const FIELD_NAME: &str = "name";

/// JavaScript-style truthiness, except that an empty array is falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Walk nested objects along `path`.
///
/// Returns `None` as soon as a step is missing or the current value is not
/// an object.
pub fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(doc, |current, field| current.as_object()?.get(*field))
}

/// The `_id` of a document, if it has a string one.
pub fn document_id(doc: &Value) -> Option<&str> {
    lookup(doc, &[FIELD_ID]).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(["1-a"])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_lookup_nested() {
        let doc = json!({"entity": {"name": "widget"}});
        assert_eq!(lookup(&doc, &["entity", "name"]), Some(&json!("widget")));
        assert_eq!(lookup(&doc, &["entity", "kind"]), None);
        assert_eq!(lookup(&doc, &["missing", "name"]), None);
    }

    #[test]
    fn test_lookup_through_non_object() {
        let doc = json!({"entity": "flat string"});
        assert_eq!(lookup(&doc, &["entity", "name"]), None);

        let doc = json!([1, 2, 3]);
        assert_eq!(lookup(&doc, &["entity"]), None);
    }

    #[test]
    fn test_document_id() {
        assert_eq!(document_id(&json!({"_id": "abc"})), Some("abc"));
        assert_eq!(document_id(&json!({"_id": 7})), None);
        assert_eq!(document_id(&json!({})), None);
    }
}
