//! Concurrent multi-source retrieval.
//!
//! One task per configured source, launched together and joined at a
//! single barrier. Results are placed into index-stable slots so the merge
//! step sees source-declaration order regardless of completion order.
//! Sibling tasks are never cancelled when one source fails; losers run to
//! completion and their results are discarded by the classifier.

use crate::document::Document;
use crate::errors::GatewayError;
use crate::events;
use crate::identifier::ContentId;
use crate::sources::{Criticality, SourceDescriptor};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;

pub type HttpClient = Client<HttpConnector, Full<Bytes>>;

pub fn build_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Terminal state of one source call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Ok,
    NotFound,
    ServerError,
    Unreachable,
}

/// What one source call produced. Consumed immediately by [`classify`].
#[derive(Debug)]
pub struct RetrievalOutcome {
    pub source: usize,
    pub status: SourceStatus,
    pub document: Option<Document>,
    /// Set when a 200 body could not be decoded as a JSON object.
    pub decode_failed: bool,
}

impl RetrievalOutcome {
    fn failed(source: usize, status: SourceStatus) -> Self {
        RetrievalOutcome {
            source,
            status,
            document: None,
            decode_failed: false,
        }
    }
}

/// What the classifier decided for one source.
#[derive(Debug)]
pub enum Disposition {
    /// The document takes part in the merge.
    Include(Document),
    /// The source's contribution is absent; the request continues.
    Omit,
    /// The whole request stops with this status and an empty body.
    Abort(StatusCode),
}

/// Maps a retrieval outcome and the source's criticality to a disposition.
///
/// A `MustSucceed` failure aborts the request (404 for not-found, 503
/// otherwise); a `BestEffort` failure only omits that source's
/// contribution. A 200 body that is not valid JSON aborts with 500
/// regardless of criticality, since a required merge input is unusable.
pub fn classify(outcome: RetrievalOutcome, criticality: Criticality) -> Disposition {
    match (outcome.status, criticality) {
        (SourceStatus::Ok, _) => match outcome.document {
            Some(document) if !outcome.decode_failed => Disposition::Include(document),
            _ => Disposition::Abort(StatusCode::INTERNAL_SERVER_ERROR),
        },
        (SourceStatus::NotFound, Criticality::MustSucceed) => {
            Disposition::Abort(StatusCode::NOT_FOUND)
        }
        (_, Criticality::MustSucceed) => Disposition::Abort(StatusCode::SERVICE_UNAVAILABLE),
        (_, Criticality::BestEffort) => Disposition::Omit,
    }
}

/// Fan-out/fan-in retrieval over the configured sources.
pub struct SourceRetriever {
    client: HttpClient,
    call_timeout: Duration,
}

impl SourceRetriever {
    pub fn new(client: HttpClient, timeout_secs: u64) -> Self {
        SourceRetriever {
            client,
            call_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Issues one GET per source in parallel and waits for all of them.
    ///
    /// The returned outcomes are in source-declaration order. A task that
    /// panics is reported as `Unreachable` for its slot.
    pub async fn retrieve_all(
        &self,
        sources: &[SourceDescriptor],
        id: &ContentId,
        expand: bool,
        transaction_id: &str,
    ) -> Vec<RetrievalOutcome> {
        let mut join_set = JoinSet::new();
        for (index, source) in sources.iter().enumerate() {
            let client = self.client.clone();
            let source = source.clone();
            let id = id.clone();
            let transaction_id = transaction_id.to_string();
            let call_timeout = self.call_timeout;

            join_set.spawn(async move {
                let outcome =
                    fetch_source(&client, index, &source, &id, expand, &transaction_id, call_timeout)
                        .await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<RetrievalOutcome>> = Vec::with_capacity(sources.len());
        slots.resize_with(sources.len(), || None);

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "retrieval task failed"),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| RetrievalOutcome::failed(index, SourceStatus::Unreachable))
            })
            .collect()
    }
}

/// Sends one GET to a source and collects the full response body.
///
/// Any client-level timeout is treated like any other transport error;
/// retries are not attempted here.
async fn send_to_source(
    client: &HttpClient,
    service: &str,
    request_url: &str,
    transaction_id: &str,
    call_timeout: Duration,
) -> Result<Response<Bytes>, GatewayError> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(request_url)
        .header(events::TRANSACTION_ID_HEADER, transaction_id)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::new()))
        .map_err(|e| GatewayError::RequestBuildError(service.to_string(), e.to_string()))?;

    let response = timeout(call_timeout, client.request(request))
        .await
        .map_err(|_| GatewayError::UpstreamTimeout(service.to_string()))?
        .map_err(|e| GatewayError::UpstreamRequestFailed(service.to_string(), e.to_string()))?;

    let (parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| GatewayError::ResponseBodyError(service.to_string(), e.to_string()))?;

    Ok(Response::from_parts(parts, bytes))
}

async fn fetch_source(
    client: &HttpClient,
    index: usize,
    source: &SourceDescriptor,
    id: &ContentId,
    expand: bool,
    transaction_id: &str,
    call_timeout: Duration,
) -> RetrievalOutcome {
    let mut request_url = format!("{}{}", source.uri, id);
    if source.content_bearing {
        request_url.push_str(&format!("?expand={expand}"));
    }

    events::request(&source.name, &request_url, transaction_id, id.as_str());

    let response = match send_to_source(
        client,
        &source.name,
        &request_url,
        transaction_id,
        call_timeout,
    )
    .await
    {
        Ok(response) => response,
        Err(e) => {
            events::error(&source.name, &request_url, transaction_id, &e, id.as_str());
            record_failed_call(&source.name);
            return RetrievalOutcome::failed(index, SourceStatus::Unreachable);
        }
    };

    let status = response.status();
    match status {
        StatusCode::OK => match serde_json::from_slice::<Document>(response.body()) {
            Ok(document) => {
                events::response(
                    &source.name,
                    &request_url,
                    status.as_u16(),
                    transaction_id,
                    id.as_str(),
                );
                RetrievalOutcome {
                    source: index,
                    status: SourceStatus::Ok,
                    document: Some(document),
                    decode_failed: false,
                }
            }
            Err(e) => {
                events::error(&source.name, &request_url, transaction_id, &e, id.as_str());
                RetrievalOutcome {
                    source: index,
                    status: SourceStatus::Ok,
                    document: None,
                    decode_failed: true,
                }
            }
        },
        StatusCode::NOT_FOUND => {
            events::request_failed(
                &source.name,
                &request_url,
                status.as_u16(),
                transaction_id,
                id.as_str(),
            );
            record_failed_call(&source.name);
            RetrievalOutcome::failed(index, SourceStatus::NotFound)
        }
        _ => {
            events::request_failed(
                &source.name,
                &request_url,
                status.as_u16(),
                transaction_id,
                id.as_str(),
            );
            record_failed_call(&source.name);
            RetrievalOutcome::failed(index, SourceStatus::ServerError)
        }
    }
}

fn record_failed_call(service: &str) {
    shared::counter!(
        crate::metrics_defs::UPSTREAM_REQUESTS_FAILED,
        "service" => service.to_string()
    )
    .increment(1);
}
