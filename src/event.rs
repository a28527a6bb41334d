//! Record definitions for the dweet HTTP API client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single dweet as stored by the service.
///
/// The service wraps every stored payload in this envelope; the payload
/// itself is schemaless and kept as a raw JSON value.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DweetRecord {
    /// The thing the dweet was published to.
    pub thing: String,
    /// The payload exactly as published.
    pub content: Value,
    /// Server-side creation timestamp.
    pub created: DateTime<Utc>,
}

impl fmt::Display for DweetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}: {}", self.thing, self.created, self.content)
    }
}
