//! Main-listener service: routes `GET /{handler_path}/{uuid}` to the
//! aggregation handler.

use crate::handler::ContentHandler;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{ServiceBody, empty_status_response};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

pub struct GatewayService {
    handler: Arc<ContentHandler>,
    handler_path: String,
}

impl GatewayService {
    pub fn new(handler: Arc<ContentHandler>, handler_path: String) -> Self {
        GatewayService {
            handler,
            handler_path,
        }
    }
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = Response<ServiceBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();
        let raw_id = match_content_path(req.uri().path(), &self.handler_path);

        Box::pin(async move {
            let Some(raw_id) = raw_id else {
                return Ok(empty_status_response(StatusCode::NOT_FOUND));
            };
            if req.method() != Method::GET {
                return Ok(empty_status_response(StatusCode::METHOD_NOT_ALLOWED));
            }
            Ok(handler.handle(&req, &raw_id).await)
        })
    }
}

/// Extracts the identifier segment from `/{handler_path}/{id}`.
fn match_content_path(path: &str, handler_path: &str) -> Option<String> {
    let rest = path
        .strip_prefix('/')?
        .strip_prefix(handler_path)?
        .strip_prefix('/')?;
    (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
}
