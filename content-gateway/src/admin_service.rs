//! Admin-listener service: liveness and readiness endpoints.

use crate::health::HealthRegistry;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::http::{ServiceBody, empty_status_response, full_response, status_response};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

pub struct AdminService {
    health: Arc<HealthRegistry>,
}

impl AdminService {
    pub fn new(health: Arc<HealthRegistry>) -> Self {
        AdminService { health }
    }
}

impl Service<Request<Incoming>> for AdminService {
    type Response = Response<ServiceBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let health = self.health.clone();

        Box::pin(async move {
            let res = match req.uri().path() {
                "/health" => full_response("ok\n"),
                "/ready" => match health.ready().await {
                    Ok(()) => full_response("ok\n"),
                    Err(failures) => {
                        status_response(StatusCode::SERVICE_UNAVAILABLE, failures.join("\n"))
                    }
                },
                _ => empty_status_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
