//! The untyped JSON document model and its structural cleanup passes.

use serde_json::{Map, Value};

/// Untyped tree of string-keyed JSON values, used for both upstream
/// responses and the merged result. No schema is enforced.
pub type Document = Map<String, Value>;

/// One node of a [`KeyFilter`] tree.
#[derive(Debug, Clone)]
pub enum FilterEntry {
    /// Remove the key at this depth.
    Remove,
    /// Descend into a sub-object; if the value is not an object, remove it.
    Nested(KeyFilter),
}

/// A data-driven denylist of document keys.
///
/// The filter is itself a tree: a `Remove` entry deletes the key where it
/// matches, a `Nested` entry recurses into a sub-object with its own
/// filter. Keys the filter does not name pass through untouched.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    entries: Vec<(&'static str, FilterEntry)>,
}

impl KeyFilter {
    pub fn removing(keys: &[&'static str]) -> Self {
        KeyFilter {
            entries: keys.iter().map(|k| (*k, FilterEntry::Remove)).collect(),
        }
    }

    pub fn nested(mut self, key: &'static str, inner: KeyFilter) -> Self {
        self.entries.push((key, FilterEntry::Nested(inner)));
        self
    }

    pub fn apply(&self, document: &mut Document) {
        for (key, entry) in &self.entries {
            match entry {
                FilterEntry::Remove => {
                    document.remove(*key);
                }
                FilterEntry::Nested(inner) => match document.get_mut(*key) {
                    Some(Value::Object(sub)) => inner.apply(sub),
                    Some(_) => {
                        document.remove(*key);
                    }
                    None => {}
                },
            }
        }
    }
}

/// Keys stripped from the merged document before it is returned.
pub fn merged_document_filter() -> KeyFilter {
    KeyFilter::removing(&["uuid", "lastModified", "publishReference"])
}

/// Keys stripped from an auxiliary source's document before merging.
/// The auxiliary `id` echoes the upstream's own identifier scheme and must
/// not overwrite the primary document's.
pub fn bookkeeping_filter() -> KeyFilter {
    KeyFilter::removing(&["id", "uuid", "lastModified", "publishReference"])
}

/// Recursively removes empty leaf values from a document.
///
/// Removed: `null` entries, empty-string entries, and object entries that
/// become empty once pruned. Array entries are pruned element-wise but the
/// array itself is always retained: an array emptied by pruning is a valid
/// terminal state, distinct from an absent field. Idempotent.
pub fn prune_empty_fields(document: &mut Document) {
    let keys: Vec<String> = document.keys().cloned().collect();
    for key in keys {
        let remove = match document.get_mut(&key) {
            Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Object(sub)) => {
                prune_empty_fields(sub);
                sub.is_empty()
            }
            Some(Value::Array(elements)) => {
                prune_empty_elements(elements);
                false
            }
            _ => false,
        };
        if remove {
            document.remove(&key);
        }
    }
}

fn prune_empty_elements(elements: &mut Vec<Value>) {
    for i in (0..elements.len()).rev() {
        let remove = match &mut elements[i] {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(sub) => {
                prune_empty_fields(sub);
                sub.is_empty()
            }
            Value::Array(inner) => {
                prune_empty_elements(inner);
                false
            }
            _ => false,
        };
        if remove {
            elements.remove(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn filter_removes_top_level_keys() {
        let mut doc = as_document(json!({
            "id": "abc",
            "uuid": "def",
            "title": "kept",
            "lastModified": "2017-01-01",
            "publishReference": "tid_x"
        }));
        merged_document_filter().apply(&mut doc);
        assert_eq!(Value::Object(doc), json!({"id": "abc", "title": "kept"}));
    }

    #[test]
    fn filter_does_not_recurse_without_nested_entry() {
        let mut doc = as_document(json!({
            "uuid": "top",
            "inner": {"uuid": "kept-at-depth"}
        }));
        merged_document_filter().apply(&mut doc);
        assert_eq!(
            Value::Object(doc),
            json!({"inner": {"uuid": "kept-at-depth"}})
        );
    }

    #[test]
    fn nested_filter_descends_into_matching_sub_object() {
        let filter = KeyFilter::removing(&["uuid"])
            .nested("details", KeyFilter::removing(&["lastModified"]));
        let mut doc = as_document(json!({
            "uuid": "top",
            "details": {"lastModified": "x", "body": "kept"}
        }));
        filter.apply(&mut doc);
        assert_eq!(Value::Object(doc), json!({"details": {"body": "kept"}}));
    }

    #[test]
    fn nested_filter_removes_non_object_value() {
        let filter = KeyFilter::default().nested("details", KeyFilter::removing(&["x"]));
        let mut doc = as_document(json!({"details": "scalar"}));
        filter.apply(&mut doc);
        assert!(doc.is_empty());
    }

    #[test]
    fn prune_removes_null_and_empty_strings() {
        let mut doc = as_document(json!({
            "title": "A",
            "standfirst": "",
            "byline": null
        }));
        prune_empty_fields(&mut doc);
        assert_eq!(Value::Object(doc), json!({"title": "A"}));
    }

    #[test]
    fn prune_removes_objects_that_become_empty() {
        let mut doc = as_document(json!({
            "alternativeTitles": {"promotionalTitle": "", "shortTitle": null},
            "title": "A"
        }));
        prune_empty_fields(&mut doc);
        assert_eq!(Value::Object(doc), json!({"title": "A"}));
    }

    #[test]
    fn prune_keeps_arrays_emptied_by_pruning() {
        let mut doc = as_document(json!({
            "embeds": [null, "", {}],
            "title": "A"
        }));
        prune_empty_fields(&mut doc);
        assert_eq!(Value::Object(doc), json!({"embeds": [], "title": "A"}));
    }

    #[test]
    fn prune_recurses_into_array_elements_and_nested_arrays() {
        let mut doc = as_document(json!({
            "embeds": [
                {"id": "1", "note": "", "tags": [null, "x"]},
                {"empty": null}
            ]
        }));
        prune_empty_fields(&mut doc);
        assert_eq!(
            Value::Object(doc),
            json!({"embeds": [{"id": "1", "tags": ["x"]}]})
        );
    }

    #[test]
    fn prune_keeps_non_empty_scalars() {
        let mut doc = as_document(json!({
            "count": 0,
            "flag": false,
            "title": "A"
        }));
        prune_empty_fields(&mut doc);
        assert_eq!(
            Value::Object(doc),
            json!({"count": 0, "flag": false, "title": "A"})
        );
    }

    #[test]
    fn prune_is_idempotent() {
        let mut doc = as_document(json!({
            "title": "A",
            "standfirst": "",
            "topper": {"images": [null, {"id": ""}]},
            "embeds": []
        }));
        prune_empty_fields(&mut doc);
        let once = doc.clone();
        prune_empty_fields(&mut doc);
        assert_eq!(doc, once);
    }
}
