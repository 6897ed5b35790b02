//! Aggregation request handling.
//!
//! Validate the identifier, fan out to every configured source, classify
//! each outcome against the source's criticality, merge the surviving
//! documents in declaration order, transform, respond.

use crate::config::Config;
use crate::document::{Document, bookkeeping_filter};
use crate::errors::GatewayError;
use crate::events;
use crate::identifier::ContentId;
use crate::retrieval::{Disposition, SourceRetriever, build_client, classify};
use crate::sources::SourceTransform;
use crate::transform::FieldTransformer;
use crate::unroller::Unroller;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Request, Response};
use serde_json::Value;
use shared::http::{ServiceBody, empty_status_response};
use std::sync::Arc;
use std::time::Instant;

pub struct ContentHandler {
    config: Arc<Config>,
    retriever: SourceRetriever,
    transformer: FieldTransformer,
}

impl ContentHandler {
    pub fn new(config: Arc<Config>) -> Self {
        let client = build_client();
        let retriever = SourceRetriever::new(client.clone(), config.http_timeout_secs);
        let unroller = Unroller::new(&config.unroller, client, config.http_timeout_secs);
        let transformer = FieldTransformer::new(
            config.api_host.clone(),
            config.handler_path.clone(),
            unroller,
        );
        ContentHandler {
            config,
            retriever,
            transformer,
        }
    }

    /// Serves one aggregation request; `raw_id` is the trailing path
    /// segment. The request body is never read.
    pub async fn handle<B>(&self, request: &Request<B>, raw_id: &str) -> Response<ServiceBody> {
        let id = match ContentId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => return invalid_identifier_response(&e),
        };

        let transaction_id = extract_transaction_id(request);
        events::transaction_started(&request.uri().to_string(), &transaction_id, id.as_str());
        let started = Instant::now();

        let expand = expand_requested(request.uri().query());

        let outcomes = self
            .retriever
            .retrieve_all(&self.config.sources, &id, expand, &transaction_id)
            .await;

        let mut included: Vec<(Document, SourceTransform)> = Vec::with_capacity(outcomes.len());
        for (outcome, source) in outcomes.into_iter().zip(&self.config.sources) {
            match classify(outcome, source.criticality) {
                Disposition::Include(document) => included.push((document, source.transform)),
                Disposition::Omit => {
                    shared::counter!(
                        crate::metrics_defs::DEGRADED_REQUESTS,
                        "service" => source.name.clone()
                    )
                    .increment(1);
                }
                Disposition::Abort(status) => {
                    shared::counter!(crate::metrics_defs::ERRORS).increment(1);
                    return empty_status_response(status);
                }
            }
        }

        let documents = included
            .into_iter()
            .map(|(mut document, transform)| {
                if transform == SourceTransform::FilterBookkeeping {
                    bookkeeping_filter().apply(&mut document);
                }
                document
            })
            .collect();

        let id_base_url = format!("http://{}/content/", self.config.api_host);
        let merged = crate::merge::merge_documents(documents, &id_base_url);

        let transformed = self
            .transformer
            .transform(merged, &id, expand, &transaction_id)
            .await;

        let body = match serde_json::to_vec(&Value::Object(transformed)) {
            Ok(body) => body,
            Err(e) => {
                let error = GatewayError::ResponseSerializationError(e.to_string());
                events::error(
                    "content-gateway",
                    &request.uri().to_string(),
                    &transaction_id,
                    &error,
                    id.as_str(),
                );
                shared::counter!(crate::metrics_defs::ERRORS).increment(1);
                return empty_status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let mut response = Response::new(Full::new(Bytes::from(body)).boxed());
        let headers = response.headers_mut();
        if let Ok(value) = self.config.cache_control.parse() {
            headers.insert(CACHE_CONTROL, value);
        }
        if let Ok(value) = "application/json; charset=utf-8".parse() {
            headers.insert(CONTENT_TYPE, value);
        }

        shared::counter!(crate::metrics_defs::RESPONSES).increment(1);
        shared::histogram!(crate::metrics_defs::REQUEST_DURATION)
            .record(started.elapsed().as_secs_f64());

        response
    }
}

fn invalid_identifier_response(error: &dyn std::fmt::Display) -> Response<ServiceBody> {
    let message = serde_json::json!({
        "message": format!("The given identifier is not valid, err={error}")
    });
    let body = message.to_string();
    let mut response = Response::new(Full::new(Bytes::from(body)).boxed());
    *response.status_mut() = StatusCode::BAD_REQUEST;
    if let Ok(value) = "application/json; charset=utf-8".parse() {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn extract_transaction_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(events::TRANSACTION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("tid_{}", uuid::Uuid::new_v4().simple()))
}

/// The `expand` query flag; anything unparsable counts as false.
fn expand_requested(query: Option<&str>) -> bool {
    let Some(query) = query else { return false };
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "expand")
        .map(|(_, value)| value.parse().unwrap_or(false))
        .unwrap_or(false)
}
