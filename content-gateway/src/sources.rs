//! Per-source policy descriptors.
//!
//! Each upstream source is described by data, not code: its criticality
//! decides whether a failure aborts the request, its transform decides how
//! the retrieved document is prepared for merging. Adding a source to a
//! deployment is a new configuration entry, never new control flow.

use serde::Deserialize;
use url::Url;

/// Whether a source's failure aborts the whole request or only degrades it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    MustSucceed,
    BestEffort,
}

/// How a source's document is prepared before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTransform {
    /// The document is merged as retrieved.
    #[default]
    Identity,
    /// Upstream bookkeeping keys are stripped before merging.
    FilterBookkeeping,
}

/// Static description of one upstream source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDescriptor {
    /// Display name, used in events and health checks.
    pub name: String,
    /// Base retrieval URI; the content identifier is appended to it.
    pub uri: Url,
    /// Health endpoint probed for readiness reporting.
    pub health_uri: Url,
    pub criticality: Criticality,
    #[serde(default)]
    pub transform: SourceTransform,
    /// The one source that receives the `expand` query flag.
    #[serde(default)]
    pub content_bearing: bool,
}
