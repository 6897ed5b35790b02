//! Document merging.
//!
//! Retrieved documents are folded left-to-right in source-declaration
//! order. Later values win for scalars, objects merge recursively, and the
//! `embeds` collection is reconciled by element identity instead of being
//! replaced wholesale.

use crate::document::Document;
use serde_json::Value;

/// The one array field whose elements are merged by identity.
pub const EMBEDS_KEY: &str = "embeds";

/// Source-internal echoes dropped from every embed element.
const EMBED_NOISE_KEYS: &[&str] = &["requestUrl"];

/// Folds documents into one, left-to-right. An empty list yields an empty
/// document; a single document is returned unchanged.
pub fn merge_documents(documents: Vec<Document>, id_base_url: &str) -> Document {
    let mut documents = documents.into_iter();
    let Some(mut merged) = documents.next() else {
        return Document::new();
    };
    for document in documents {
        merged = merge_maps(merged, document, id_base_url);
    }
    merged
}

/// Right-biased recursive merge of two objects.
fn merge_maps(mut base: Document, overlay: Document, id_base_url: &str) -> Document {
    for (key, overlay_value) in overlay {
        match base.remove(&key) {
            None => {
                base.insert(key, overlay_value);
            }
            Some(base_value) => {
                let merged = merge_values(&key, base_value, overlay_value, id_base_url);
                base.insert(key, merged);
            }
        }
    }
    base
}

fn merge_values(key: &str, base: Value, overlay: Value, id_base_url: &str) -> Value {
    if key == EMBEDS_KEY {
        return match (base, overlay) {
            (Value::Array(a), Value::Array(b)) => Value::Array(merge_embeds(a, b, id_base_url)),
            (_, overlay) => overlay,
        };
    }
    match (base, overlay) {
        (Value::Object(a), Value::Object(b)) => Value::Object(merge_maps(a, b, id_base_url)),
        (_, overlay) => overlay,
    }
}

/// Identity-reconciled merge of two embed collections.
///
/// Every element is canonicalized first. Overlay elements that match an
/// existing element by identifier are merged into it in place; unmatched
/// overlay elements are appended after the retained elements. Overlay
/// entries that are not objects, or that carry no identifier, never match.
fn merge_embeds(mut base: Vec<Value>, overlay: Vec<Value>, id_base_url: &str) -> Vec<Value> {
    for element in &mut base {
        if let Value::Object(embed) = element {
            canonicalize_embed(embed, id_base_url);
        }
    }

    for overlay_value in overlay {
        let Value::Object(mut embed) = overlay_value else {
            continue;
        };
        canonicalize_embed(&mut embed, id_base_url);

        let matched = embed_identity(&embed).and_then(|identity| {
            base.iter().position(
                |existing| matches!(existing, Value::Object(e) if embed_identity(e).as_deref() == Some(identity.as_str())),
            )
        });

        match matched {
            Some(index) => {
                let existing = std::mem::take(&mut base[index]);
                base[index] = match existing {
                    Value::Object(existing) => {
                        Value::Object(merge_maps(existing, embed, id_base_url))
                    }
                    _ => Value::Object(embed),
                };
            }
            None => base.push(Value::Object(embed)),
        }
    }
    base
}

/// Rewrites an embed element's identifier into canonical URL form and
/// drops source-internal noise keys.
///
/// A bare `uuid` field becomes `id = <base><uuid>` and is removed; a bare
/// `id` (no path separators) is likewise prefixed. An `id` that is already
/// a URL is left alone.
fn canonicalize_embed(embed: &mut Document, id_base_url: &str) {
    let from_uuid = match embed.get("uuid") {
        Some(Value::String(uuid)) => Some(format!("{id_base_url}{uuid}")),
        _ => None,
    };
    if let Some(id_url) = from_uuid {
        embed.insert("id".to_string(), Value::String(id_url));
        embed.remove("uuid");
    } else {
        let from_bare_id = match embed.get("id") {
            Some(Value::String(id)) if !id.contains('/') => Some(format!("{id_base_url}{id}")),
            _ => None,
        };
        if let Some(id_url) = from_bare_id {
            embed.insert("id".to_string(), Value::String(id_url));
        }
    }

    for key in EMBED_NOISE_KEYS {
        embed.remove(*key);
    }
}

/// The identity an embed element is matched by: the trailing path segment
/// of its `id`, so URL-form and bare identifiers compare equal.
fn embed_identity(embed: &Document) -> Option<String> {
    match embed.get("id") {
        Some(Value::String(id)) => Some(canonical_identifier(id).to_string()),
        _ => None,
    }
}

pub(crate) fn canonical_identifier(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}
