//! HTTP listener plumbing shared by the gateway and admin services.

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Body type used by every service in this workspace.
pub type ServiceBody = BoxBody<Bytes, Infallible>;

/// Binds `host:port` and serves connections with the given hyper service.
///
/// Each accepted connection is handed to its own task; the protocol (h1/h2)
/// is auto-detected per socket. Accept errors are logged and the loop keeps
/// going, so one misbehaving peer cannot take the listener down.
pub async fn run_http_service<S, E>(host: &str, port: u16, service: S) -> Result<(), std::io::Error>
where
    S: Service<Request<Incoming>, Response = Response<ServiceBody>, Error = E>
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    let service = Arc::new(service);

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let svc = service.clone();

        tokio::spawn(async move {
            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                tracing::debug!(peer = %peer_addr, error = %e, "connection closed with error");
            }
        });
    }
}

/// A response with the given status and no body.
pub fn empty_status_response(status: StatusCode) -> Response<ServiceBody> {
    let mut response = Response::new(Empty::<Bytes>::new().boxed());
    *response.status_mut() = status;
    response
}

/// A response with the given status carrying the given bytes.
pub fn status_response(status: StatusCode, body: impl Into<Bytes>) -> Response<ServiceBody> {
    let mut response = Response::new(Full::new(body.into()).boxed());
    *response.status_mut() = status;
    response
}

/// A 200 response carrying the given bytes.
pub fn full_response(body: impl Into<Bytes>) -> Response<ServiceBody> {
    status_response(StatusCode::OK, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_has_status_and_no_content() {
        let response = empty_status_response(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_response_carries_body() {
        let response = full_response("ok\n");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"ok\n");
    }
}
