//! In-process mock upstreams for tests.

use crate::config::{Config, Listener, UnrollerConfig};
use crate::sources::{Criticality, SourceDescriptor, SourceTransform};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use url::Url;

/// What a recording mock saw for one request.
#[derive(Debug)]
pub struct RecordedRequest {
    pub uri: String,
    pub transaction_id: Option<String>,
}

/// Starts a mock server that always answers with the given status and body.
pub async fn start_mock_service(status: StatusCode, body: &'static str) -> u16 {
    serve_mock(status, body, Duration::ZERO, None).await
}

/// Like [`start_mock_service`], but sleeps before answering.
pub async fn start_slow_mock_service(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> u16 {
    serve_mock(status, body, delay, None).await
}

/// Starts a mock server that also reports every request it receives.
pub async fn start_recording_mock_service(
    status: StatusCode,
    body: &'static str,
) -> (u16, mpsc::UnboundedReceiver<RecordedRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let port = serve_mock(status, body, Duration::ZERO, Some(tx)).await;
    (port, rx)
}

async fn serve_mock(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    recorder: Option<mpsc::UnboundedSender<RecordedRequest>>,
) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let io = TokioIo::new(stream);
            let recorder = recorder.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let recorder = recorder.clone();
                    async move {
                        if let Some(tx) = recorder {
                            let _ = tx.send(RecordedRequest {
                                uri: req.uri().to_string(),
                                transaction_id: req
                                    .headers()
                                    .get(crate::events::TRANSACTION_ID_HEADER)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string),
                            });
                        }
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        let mut response = Response::new(Full::new(Bytes::from_static(
                            body.as_bytes(),
                        )));
                        *response.status_mut() = status;
                        Ok::<_, Infallible>(response)
                    }
                });

                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    port
}

/// Serves a real service instance on an ephemeral port, as
/// `shared::http::run_http_service` would, and returns the port.
pub async fn spawn_service<S>(service: S) -> u16
where
    S: hyper::service::Service<
            Request<Incoming>,
            Response = Response<shared::http::ServiceBody>,
            Error = Infallible,
        > + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let service = std::sync::Arc::new(service);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let io = TokioIo::new(stream);
            let svc = service.clone();
            tokio::spawn(async move {
                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, svc)
                    .await;
            });
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    port
}

fn local_url(port: u16, path: &str) -> Url {
    Url::parse(&format!("http://127.0.0.1:{port}{path}")).unwrap()
}

/// A source descriptor pointing at a local mock port.
pub fn mock_source(name: &str, port: u16, criticality: Criticality) -> SourceDescriptor {
    SourceDescriptor {
        name: name.to_string(),
        uri: local_url(port, "/content/"),
        health_uri: local_url(port, "/__health"),
        criticality,
        transform: SourceTransform::Identity,
        content_bearing: false,
    }
}

/// A full gateway config wired to local mock ports: a content-bearing
/// primary, a filtered auxiliary, and an unroller.
pub fn mock_config(primary_port: u16, auxiliary_port: u16, unroller_port: u16) -> Config {
    let mut primary = mock_source("enriched-content", primary_port, Criticality::MustSucceed);
    primary.content_bearing = true;
    let mut auxiliary = mock_source(
        "internal-components",
        auxiliary_port,
        Criticality::BestEffort,
    );
    auxiliary.transform = SourceTransform::FilterBookkeeping;

    Config {
        listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 8084,
        },
        admin_listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 8085,
        },
        handler_path: "internalcontent".to_string(),
        cache_control: "max-age=10".to_string(),
        api_host: "api.example.com".to_string(),
        http_timeout_secs: 2,
        sources: vec![primary, auxiliary],
        unroller: UnrollerConfig {
            name: "content-unroller".to_string(),
            uri: local_url(unroller_port, "/expand"),
            health_uri: local_url(unroller_port, "/__health"),
        },
        metrics: None,
        sentry_dsn: None,
    }
}
