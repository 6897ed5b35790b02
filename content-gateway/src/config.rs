use crate::sources::{Criticality, SourceDescriptor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Handler path cannot be empty or contain '/'")]
    InvalidHandlerPath,

    #[error("At least two sources must be configured")]
    TooFewSources,

    #[error("Empty source name")]
    EmptySourceName,

    #[error("Duplicate source name: {0}")]
    DuplicateSource(String),

    #[error("Exactly one source must be must_succeed, found {0}")]
    PrimarySourceCount(usize),

    #[error("At most one source can be content_bearing")]
    MultipleContentBearingSources,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Expansion collaborator configuration
#[derive(Clone, Debug, Deserialize)]
pub struct UnrollerConfig {
    pub name: String,
    pub uri: Url,
    pub health_uri: Url,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    pub prefix: String,
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Main listener for aggregation requests
    pub listener: Listener,
    /// Admin listener for health and readiness endpoints
    pub admin_listener: Listener,
    /// Path segment the content handler is mounted on; a trailing
    /// `-preview` suffix marks the deployment as preview-mode.
    pub handler_path: String,
    /// Cache-Control header value for successful responses
    pub cache_control: String,
    /// Public API host used when rewriting identifiers into URLs
    pub api_host: String,
    /// Timeout applied to each outbound call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Upstream sources, in merge order
    pub sources: Vec<SourceDescriptor>,
    /// Content expansion collaborator
    pub unroller: UnrollerConfig,
    /// StatsD endpoint; metrics are discarded when absent
    pub metrics: Option<MetricsConfig>,
    /// Error reporting DSN; reporting is disabled when absent
    pub sentry_dsn: Option<String>,
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.handler_path.is_empty() || self.handler_path.contains('/') {
            return Err(ValidationError::InvalidHandlerPath);
        }

        if self.sources.len() < 2 {
            return Err(ValidationError::TooFewSources);
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.is_empty() {
                return Err(ValidationError::EmptySourceName);
            }
            if !names.insert(&source.name) {
                return Err(ValidationError::DuplicateSource(source.name.clone()));
            }
        }

        let primaries = self
            .sources
            .iter()
            .filter(|s| s.criticality == Criticality::MustSucceed)
            .count();
        if primaries != 1 {
            return Err(ValidationError::PrimarySourceCount(primaries));
        }

        if self.sources.iter().filter(|s| s.content_bearing).count() > 1 {
            return Err(ValidationError::MultipleContentBearingSources);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_YAML: &str = r#"
listener:
    host: "0.0.0.0"
    port: 8084
admin_listener:
    host: "127.0.0.1"
    port: 8085
handler_path: internalcontent
cache_control: "max-age=10"
api_host: api.example.com
sources:
    - name: enriched-content
      uri: "http://localhost:8080/enrichedcontent/"
      health_uri: "http://localhost:8080/__enriched/__health"
      criticality: must_succeed
      content_bearing: true
    - name: internal-components
      uri: "http://localhost:8080/internalcomponents/"
      health_uri: "http://localhost:8080/__components/__health"
      criticality: best_effort
      transform: filter_bookkeeping
unroller:
    name: content-unroller
    uri: "http://localhost:8080/expand"
    health_uri: "http://localhost:8080/__unroller/__health"
"#;

    fn valid_config() -> Config {
        serde_yaml::from_str(VALID_YAML).unwrap()
    }

    #[test]
    fn test_parse_valid_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8084);
        assert_eq!(config.handler_path, "internalcontent");
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].criticality, Criticality::MustSucceed);
        assert!(config.sources[0].content_bearing);
        assert!(config.metrics.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{VALID_YAML}").expect("write yaml");

        let config = Config::from_file(tmp.path()).expect("load config");
        assert_eq!(config.sources[1].name, "internal-components");
        assert_eq!(config.unroller.name, "content-unroller");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = valid_config();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = valid_config();
        config.handler_path = "internal/content".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidHandlerPath
        ));

        let mut config = valid_config();
        config.sources.truncate(1);
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::TooFewSources
        ));

        let mut config = valid_config();
        config.sources[1].name = config.sources[0].name.clone();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::DuplicateSource(_)
        ));

        let mut config = valid_config();
        config.sources[1].name = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptySourceName
        ));

        let mut config = valid_config();
        config.sources[1].criticality = Criticality::MustSucceed;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::PrimarySourceCount(2)
        ));

        let mut config = valid_config();
        config.sources[1].content_bearing = true;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::MultipleContentBearingSources
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid source URL
        assert!(
            serde_yaml::from_str::<Config>(&VALID_YAML.replace(
                "http://localhost:8080/enrichedcontent/",
                "not-a-url"
            ))
            .is_err()
        );

        // Invalid criticality
        assert!(
            serde_yaml::from_str::<Config>(&VALID_YAML.replace("best_effort", "optional")).is_err()
        );

        // Missing required section
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 8084}
"#
            )
            .is_err()
        );
    }
}
