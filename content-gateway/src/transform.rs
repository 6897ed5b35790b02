//! Post-merge field transformation.
//!
//! Runs once over the merged document: bookkeeping keys are stripped, lead
//! image identifiers become public URLs, the optional expansion call is
//! made (falling back silently on any failure), the canonical request/API
//! URL fields are set, and empty values are pruned.

use crate::document::{Document, merged_document_filter, prune_empty_fields};
use crate::events;
use crate::identifier::ContentId;
use crate::unroller::Unroller;
use serde_json::Value;

/// Handler paths ending in this suffix serve preview content, which has no
/// stable API URL.
pub const PREVIEW_SUFFIX: &str = "-preview";

pub struct FieldTransformer {
    api_host: String,
    handler_path: String,
    unroller: Unroller,
}

impl FieldTransformer {
    pub fn new(api_host: String, handler_path: String, unroller: Unroller) -> Self {
        FieldTransformer {
            api_host,
            handler_path,
            unroller,
        }
    }

    pub async fn transform(
        &self,
        mut document: Document,
        id: &ContentId,
        expand: bool,
        transaction_id: &str,
    ) -> Document {
        merged_document_filter().apply(&mut document);
        rewrite_lead_images(&mut document, &self.api_host);

        if expand {
            normalize_identifier(&mut document);
            match self.unroller.unroll(&document, transaction_id, id.as_str()).await {
                Ok(expanded) => document = expanded,
                Err(e) => {
                    // Expansion never aborts: keep the pre-expansion document.
                    events::error(
                        self.unroller.name(),
                        self.unroller.uri(),
                        transaction_id,
                        &e,
                        id.as_str(),
                    );
                    shared::counter!(crate::metrics_defs::ERRORS).increment(1);
                }
            }
        }

        resolve_request_url(&mut document, &self.api_host, &self.handler_path, id);
        resolve_api_url(&mut document, &self.api_host, &self.handler_path, id);
        prune_empty_fields(&mut document);
        document
    }
}

/// Rewrites every lead image's bare identifier into a public content URL.
fn rewrite_lead_images(document: &mut Document, api_host: &str) {
    let Some(Value::Array(images)) = document.get_mut("leadImages") else {
        return;
    };
    for image in images {
        let Value::Object(image) = image else {
            continue;
        };
        let rewritten = match image.get("id") {
            Some(Value::String(id)) => format!("http://{api_host}/content/{id}"),
            _ => continue,
        };
        image.insert("id".to_string(), Value::String(rewritten));
    }
}

/// A residual `uuid` key becomes the document's `id` before the document is
/// shipped to the expansion collaborator.
fn normalize_identifier(document: &mut Document) {
    if let Some(uuid) = document.remove("uuid") {
        document.insert("id".to_string(), uuid);
    }
}

fn resolve_request_url(document: &mut Document, api_host: &str, handler_path: &str, id: &ContentId) {
    document.insert(
        "requestUrl".to_string(),
        Value::String(public_url(api_host, handler_path, id)),
    );
}

/// Preview deployments have no stable API URL, so the field is omitted.
fn resolve_api_url(document: &mut Document, api_host: &str, handler_path: &str, id: &ContentId) {
    if !is_preview(handler_path) {
        document.insert(
            "apiUrl".to_string(),
            Value::String(public_url(api_host, handler_path, id)),
        );
    }
}

fn is_preview(handler_path: &str) -> bool {
    handler_path.ends_with(PREVIEW_SUFFIX)
}

fn public_url(api_host: &str, handler_path: &str, id: &ContentId) -> String {
    let path = handler_path.strip_suffix(PREVIEW_SUFFIX).unwrap_or(handler_path);
    format!("http://{api_host}/{path}/{id}")
}
