use reqwest::StatusCode;
use thiserror::Error;

/// A specialized `Result` type for the dweet HTTP API crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the dweet HTTP API crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {0} response")]
    Http(StatusCode),

    /// The service envelope marked the call as failed; carries the
    /// service-provided reason verbatim.
    #[error("{0}")]
    Application(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
