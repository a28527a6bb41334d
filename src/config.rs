//! Configuration options for the dweet HTTP API client.

use std::time::Duration;

/// Default service origin.
pub const DEFAULT_BASE_URL: &str = "https://dweet.io";

/// Default overall budget for a streaming listen session.
pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(900);

/// Configuration for the dweet client.
#[derive(Clone, Debug)]
pub struct Config {
    /// Origin of the dweet service (e.g. "https://dweet.io").
    pub base_url: String,
    /// Overall elapsed-time budget for a listen session, measured from the
    /// first connection attempt and never reset by reconnects.
    /// `None` listens indefinitely.
    pub listen_timeout: Option<Duration>,
    /// Optional timeout for non-streaming HTTP requests.
    pub timeout: Option<Duration>,
    /// Debug mode flag.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            listen_timeout: Some(DEFAULT_LISTEN_TIMEOUT),
            timeout: None,
            debug: false,
        }
    }
}
