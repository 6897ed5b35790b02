//! Content expansion collaborator client.
//!
//! The unroller inlines referenced sub-resources (lead images) into the
//! document. Every failure mode is surfaced as an [`UnrollError`] so the
//! caller can fall back to the pre-expansion document; nothing here aborts
//! a request.

use crate::config::UnrollerConfig;
use crate::document::Document;
use crate::events;
use crate::retrieval::HttpClient;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use url::Url;

#[derive(Error, Debug)]
pub enum UnrollError {
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("failed to build expansion request: {0}")]
    RequestBuild(String),

    #[error("expansion call failed: {0}")]
    Transport(String),

    #[error("expansion call timed out")]
    Timeout,

    #[error("received status code {0} from {1}")]
    Status(u16, String),

    #[error("failed to read expansion response body: {0}")]
    Body(String),

    #[error("expansion response is not a JSON object: {0}")]
    MalformedBody(String),

    #[error("cannot find leadImages in expansion response")]
    MissingLeadImages,
}

pub struct Unroller {
    name: String,
    uri: Url,
    client: HttpClient,
    call_timeout: Duration,
}

impl Unroller {
    pub fn new(config: &UnrollerConfig, client: HttpClient, timeout_secs: u64) -> Self {
        Unroller {
            name: config.name.clone(),
            uri: config.uri.clone(),
            client,
            call_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        self.uri.as_str()
    }

    /// POSTs the document and returns the expanded rendition.
    ///
    /// The response must be a JSON object with a `leadImages` array; each
    /// element's nested image sub-object gets its identifier rewritten
    /// before the rendition is returned.
    pub async fn unroll(
        &self,
        document: &Document,
        transaction_id: &str,
        uuid: &str,
    ) -> Result<Document, UnrollError> {
        let body = serde_json::to_vec(document).map_err(|e| UnrollError::Serialize(e.to_string()))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.uri.as_str())
            .header(events::TRANSACTION_ID_HEADER, transaction_id)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| UnrollError::RequestBuild(e.to_string()))?;

        events::request(&self.name, self.uri.as_str(), transaction_id, uuid);

        let response = match timeout(self.call_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(UnrollError::Transport(e.to_string())),
            Err(_elapsed) => return Err(UnrollError::Timeout),
        };

        let status = response.status();
        if status != StatusCode::OK {
            events::request_failed(
                &self.name,
                self.uri.as_str(),
                status.as_u16(),
                transaction_id,
                uuid,
            );
            return Err(UnrollError::Status(status.as_u16(), self.name.clone()));
        }
        events::response(
            &self.name,
            self.uri.as_str(),
            status.as_u16(),
            transaction_id,
            uuid,
        );

        let bytes = response
            .into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| UnrollError::Body(e.to_string()))?;

        let mut expanded: Document =
            serde_json::from_slice(&bytes).map_err(|e| UnrollError::MalformedBody(e.to_string()))?;

        let Some(Value::Array(lead_images)) = expanded.get_mut("leadImages") else {
            return Err(UnrollError::MissingLeadImages);
        };
        for element in lead_images {
            if let Value::Object(lead_image) = element {
                rewrite_expanded_image(lead_image);
            }
        }

        Ok(expanded)
    }
}

/// Rewrites one expanded lead image in place.
///
/// The nested `image` sub-object gets `id` and `apiUrl` set from its own
/// `requestUrl` echo, falling back to the element's `id`; the echo is then
/// dropped. Elements without an image sub-object, or without a usable
/// string identifier, pass through unchanged.
fn rewrite_expanded_image(lead_image: &mut Document) {
    let candidate = {
        let Some(Value::Object(image)) = lead_image.get("image") else {
            return;
        };
        image
            .get("requestUrl")
            .or_else(|| lead_image.get("id"))
            .cloned()
    };
    let Some(Value::String(api_url)) = candidate else {
        return;
    };

    if let Some(Value::Object(image)) = lead_image.get_mut("image") {
        image.insert("id".to_string(), Value::String(api_url.clone()));
        image.insert("apiUrl".to_string(), Value::String(api_url));
        image.remove("requestUrl");
    }
}
