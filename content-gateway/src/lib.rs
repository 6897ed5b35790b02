pub mod admin_service;
pub mod config;
pub mod document;
pub mod errors;
pub mod events;
pub mod handler;
pub mod health;
pub mod identifier;
pub mod merge;
pub mod metrics_defs;
pub mod retrieval;
pub mod service;
pub mod sources;
pub mod transform;
pub mod unroller;

#[cfg(test)]
pub(crate) mod testutils;

use crate::admin_service::AdminService;
use crate::config::Config;
use crate::errors::GatewayError;
use crate::handler::ContentHandler;
use crate::health::HealthRegistry;
use crate::service::GatewayService;
use std::sync::Arc;

/// Starts the gateway and admin listeners and serves until one of them
/// fails to accept connections.
pub async fn run(config: Config) -> Result<(), GatewayError> {
    let config = Arc::new(config);

    let handler = Arc::new(ContentHandler::new(config.clone()));
    let gateway = GatewayService::new(handler, config.handler_path.clone());

    let health = Arc::new(HealthRegistry::from_config(&config));
    let admin = AdminService::new(health);

    tracing::info!(
        listener = %format!("{}:{}", config.listener.host, config.listener.port),
        admin_listener = %format!("{}:{}", config.admin_listener.host, config.admin_listener.port),
        handler_path = %config.handler_path,
        "content-gateway listening"
    );

    tokio::try_join!(
        shared::http::run_http_service(&config.listener.host, config.listener.port, gateway),
        shared::http::run_http_service(&config.admin_listener.host, config.admin_listener.port, admin),
    )?;
    Ok(())
}
