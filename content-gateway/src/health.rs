//! Collaborator health probes and aggregate readiness.
//!
//! Each configured source and the expansion collaborator gets a probe that
//! GETs its health URI and succeeds iff the response is HTTP 200. The
//! gateway is ready iff every probe succeeds.

use crate::config::Config;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

#[derive(Error, Debug)]
pub enum HealthCheckError {
    #[error("{service} service is unreachable: {reason}")]
    Unreachable { service: String, reason: String },

    #[error("{service} service is not responding with OK. status={status}")]
    NotOk { service: String, status: u16 },
}

/// Zero-argument probe against one collaborator's health endpoint.
#[derive(Clone)]
pub struct ServiceProbe {
    name: String,
    health_uri: Url,
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl ServiceProbe {
    fn new(name: &str, health_uri: &Url, client: reqwest::Client, probe_timeout: Duration) -> Self {
        ServiceProbe {
            name: name.to_string(),
            health_uri: health_uri.clone(),
            client,
            probe_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn probe(&self) -> Result<String, HealthCheckError> {
        let response = self
            .client
            .get(self.health_uri.clone())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| HealthCheckError::Unreachable {
                service: self.name.clone(),
                reason: e.to_string(),
            })?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(HealthCheckError::NotOk {
                service: self.name.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok("Ok".to_string())
    }
}

/// All collaborator probes for one deployment.
pub struct HealthRegistry {
    probes: Vec<ServiceProbe>,
}

impl HealthRegistry {
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::new();
        let probe_timeout = Duration::from_secs(config.http_timeout_secs);

        let mut probes: Vec<ServiceProbe> = config
            .sources
            .iter()
            .map(|source| {
                ServiceProbe::new(&source.name, &source.health_uri, client.clone(), probe_timeout)
            })
            .collect();
        probes.push(ServiceProbe::new(
            &config.unroller.name,
            &config.unroller.health_uri,
            client,
            probe_timeout,
        ));

        HealthRegistry { probes }
    }

    pub fn probes(&self) -> &[ServiceProbe] {
        &self.probes
    }

    /// Runs every probe concurrently; `Err` carries the failure messages.
    pub async fn ready(&self) -> Result<(), Vec<String>> {
        let mut join_set = JoinSet::new();
        for probe in &self.probes {
            let probe = probe.clone();
            join_set.spawn(async move { probe.probe().await });
        }

        let mut failures = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => failures.push(e.to_string()),
                Err(e) => failures.push(format!("probe task failed: {e}")),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            failures.sort();
            Err(failures)
        }
    }
}
