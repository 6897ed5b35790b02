//! Content identifier validation.
//!
//! Identifiers are UUIDs in canonical lowercase-hyphenated form. Parsing
//! alone is not enough: the `uuid` crate accepts simple, braced, urn and
//! mixed-case renditions, so the canonical re-serialization must equal the
//! input exactly.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IdentifierError {
    #[error("not a UUID: {0}")]
    Unparsable(#[from] uuid::Error),

    #[error("identifier {given} is not in canonical form (expected {canonical})")]
    NonCanonical { given: String, canonical: String },
}

/// A validated content identifier, the correlation key across all sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentId(String);

impl ContentId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let parsed = Uuid::parse_str(raw)?;
        let canonical = parsed.as_hyphenated().to_string();
        if canonical != raw {
            return Err(IdentifierError::NonCanonical {
                given: raw.to_string(),
                canonical,
            });
        }
        Ok(ContentId(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
