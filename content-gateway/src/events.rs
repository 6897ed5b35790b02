//! Structured observability events.
//!
//! Every event carries the same correlation fields (service, URL,
//! transaction id, status, content identifier) so a single request can be
//! traced across the fan-out and the expansion call.

use std::fmt::Display;

/// Correlation header forwarded to every collaborator.
pub const TRANSACTION_ID_HEADER: &str = "x-request-id";

pub fn transaction_started(request_url: &str, transaction_id: &str, uuid: &str) {
    tracing::info!(
        event = "transaction_started",
        request_url,
        transaction_id,
        uuid,
    );
}

pub fn request(service: &str, request_url: &str, transaction_id: &str, uuid: &str) {
    tracing::info!(event = "request", service, request_url, transaction_id, uuid);
}

pub fn response(service: &str, request_url: &str, status: u16, transaction_id: &str, uuid: &str) {
    tracing::info!(
        event = "response",
        service,
        request_url,
        status,
        transaction_id,
        uuid,
        "response from {service}"
    );
}

pub fn request_failed(
    service: &str,
    request_url: &str,
    status: u16,
    transaction_id: &str,
    uuid: &str,
) {
    tracing::warn!(
        event = "request_failed",
        service,
        request_url,
        status,
        transaction_id,
        uuid,
        "request failed, {service} responded with {status}"
    );
}

pub fn error(
    service: &str,
    request_url: &str,
    transaction_id: &str,
    error: &dyn Display,
    uuid: &str,
) {
    tracing::warn!(
        event = "error",
        service,
        request_url,
        transaction_id,
        error = %error,
        uuid,
        "cannot get a usable response from {service}"
    );
}
