//! # Dweet Client
//!
//! This module implements a full-featured dweet.io client, mirroring the
//! functionality of the reference clients for the service. It supports:
//! - Publishing dweets for named and unnamed things
//! - Reading the latest dweet or the stored history for a thing
//! - Streaming subscriptions (via [`crate::listen::DweetListener`])
//! - Thing locking/unlocking and outright lock removal
//! - Conditional alerts (set/get/remove)
//!
//! Every non-streaming endpoint answers with the same envelope,
//! `{"this": "succeeded"|"failed", "because": ..., "with": ...}`; the shared
//! request primitive unwraps it, turning a failed envelope into
//! [`Error::Application`] and a non-success status into [`Error::Http`].

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    error::{Error, Result},
    event::DweetRecord,
    listen::DweetListener,
    utils::{encode_condition, join_recipients},
};

/// The HTTP verbs used by the dweet service.
#[derive(Clone, Copy, Debug)]
enum Verb {
    Get,
    Post,
}

/// Response envelope shared by every non-streaming endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    this: String,
    #[serde(default)]
    because: Option<Value>,
    #[serde(default)]
    with: Option<Value>,
}

/// Unwraps a service envelope into the `with` payload, decoded as `T`.
fn unwrap_envelope<T>(envelope: Envelope) -> Result<T>
where
    T: DeserializeOwned,
{
    if envelope.this == "failed" {
        let because = match envelope.because {
            Some(Value::String(reason)) => reason,
            Some(other) => other.to_string(),
            None => "the request failed without a reason".to_string(),
        };
        return Err(Error::Application(because));
    }
    Ok(serde_json::from_value(envelope.with.unwrap_or(Value::Null))?)
}

/// Builds the query-parameter list for an optional access key.
/// The `key` parameter is omitted entirely when no key is supplied.
fn key_query(key: Option<&str>) -> Vec<(&'static str, &str)> {
    match key {
        Some(key) => vec![("key", key)],
        None => Vec::new(),
    }
}

/// The main dweet client struct.
pub struct Dweet {
    /// Underlying HTTP client (shared connection pool)
    client: Client,
    /// Configuration
    config: Config,
}

impl Dweet {
    /// Creates a new dweet client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Creates a new dweet client with custom configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    /// Wraps an existing HTTP client, sharing its connection pool across
    /// this and any other consumers of the client.
    pub fn with_client(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Issues a single request against the service and unwraps the envelope.
    ///
    /// No retries happen at this layer; retry policy belongs to the
    /// streaming listener only.
    async fn request<T>(
        &self,
        verb: Verb,
        path: &str,
        query: &[(&'static str, &str)],
        body: Option<&Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, path);
        if self.config.debug {
            println!("{:?} {}", verb, url);
        }
        let mut req = match verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
        };
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(timeout) = self.config.timeout {
            req = req.timeout(timeout);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(Error::Http(resp.status()));
        }
        let envelope = resp.json::<Envelope>().await?;
        unwrap_envelope(envelope)
    }

    /// Sends a dweet without naming a thing.
    pub async fn dweet<T: Serialize>(&self, payload: &T) -> Result<DweetRecord> {
        let body = serde_json::to_value(payload)?;
        self.request(Verb::Post, "/dweet", &[], Some(&body)).await
    }

    /// Sends a dweet for a thing with a known name.
    pub async fn dweet_for<T: Serialize>(
        &self,
        thing_name: &str,
        payload: &T,
        key: Option<&str>,
    ) -> Result<DweetRecord> {
        let body = serde_json::to_value(payload)?;
        let path = format!("/dweet/for/{}", thing_name);
        self.request(Verb::Post, &path, &key_query(key), Some(&body))
            .await
    }

    /// Reads the latest dweet for a thing. The service answers with a
    /// one-element list.
    pub async fn get_latest_dweet_for(
        &self,
        thing_name: &str,
        key: Option<&str>,
    ) -> Result<Vec<DweetRecord>> {
        let path = format!("/get/latest/dweet/for/{}", thing_name);
        self.request(Verb::Get, &path, &key_query(key), None).await
    }

    /// Reads all stored dweets for a thing.
    pub async fn get_dweets_for(
        &self,
        thing_name: &str,
        key: Option<&str>,
    ) -> Result<Vec<DweetRecord>> {
        let path = format!("/get/dweets/for/{}", thing_name);
        self.request(Verb::Get, &path, &key_query(key), None).await
    }

    /// Locks a thing (prevents unkeyed dweets for the locked thing).
    pub async fn lock(&self, thing_name: &str, lock: &str, key: &str) -> Result<Value> {
        let path = format!("/lock/{}", thing_name);
        self.request(Verb::Get, &path, &[("key", key), ("lock", lock)], None)
            .await
    }

    /// Unlocks a thing.
    pub async fn unlock(&self, thing_name: &str, key: &str) -> Result<Value> {
        let path = format!("/unlock/{}", thing_name);
        self.request(Verb::Get, &path, &[("key", key)], None).await
    }

    /// Removes a lock, no matter which thing it is attached to.
    /// Returns the removed lock's identifier.
    pub async fn remove_lock(&self, lock: &str, key: &str) -> Result<String> {
        let path = format!("/remove/lock/{}", lock);
        self.request(Verb::Get, &path, &[("key", key)], None).await
    }

    /// Sets an alert on a thing with the given condition.
    ///
    /// `who` is the list of recipient addresses; `condition` is the alert
    /// expression, percent-encoded before insertion into the path.
    pub async fn set_alert(
        &self,
        thing_name: &str,
        who: &[&str],
        condition: &str,
        key: &str,
    ) -> Result<Value> {
        let path = format!(
            "/alert/{}/when/{}/{}",
            join_recipients(who),
            thing_name,
            encode_condition(condition),
        );
        self.request(Verb::Get, &path, &[("key", key)], None).await
    }

    /// Reads the alert currently set on a thing.
    pub async fn get_alert(&self, thing_name: &str, key: &str) -> Result<Value> {
        let path = format!("/get/alert/for/{}", thing_name);
        self.request(Verb::Get, &path, &[("key", key)], None).await
    }

    /// Removes the alert set on a thing.
    pub async fn remove_alert(&self, thing_name: &str, key: &str) -> Result<Value> {
        let path = format!("/remove/alert/for/{}", thing_name);
        self.request(Verb::Get, &path, &[("key", key)], None).await
    }

    /// Creates a real-time subscription to dweets for a thing.
    ///
    /// The returned listener does no network work until first polled. Its
    /// elapsed-time budget defaults to [`Config::listen_timeout`] and may be
    /// overridden with [`DweetListener::with_timeout`] before the first poll.
    pub fn listen_for_dweets_from(&self, thing_name: &str, key: Option<&str>) -> DweetListener {
        let url = format!("{}/listen/for/dweets/from/{}", self.config.base_url, thing_name);
        let query = key
            .map(|key| vec![("key".to_string(), key.to_string())])
            .unwrap_or_default();
        DweetListener::new(
            self.client.clone(),
            url,
            query,
            self.config.listen_timeout,
            self.config.debug,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(raw: Value) -> Envelope {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn unwrap_succeeded_envelope_decodes_with() {
        let envelope = envelope(json!({
            "this": "succeeded",
            "by": "dweeting",
            "with": {
                "thing": "abc-123",
                "content": {"hello": "world", "somenum": 6816513845u64},
                "created": "2024-05-01T12:00:00.000Z",
            },
        }));
        let record: DweetRecord = unwrap_envelope(envelope).unwrap();
        assert_eq!(record.thing, "abc-123");
        assert_eq!(record.content["hello"], "world");
        assert_eq!(record.content["somenum"], 6816513845u64);
    }

    #[test]
    fn unwrap_failed_envelope_carries_reason_verbatim() {
        let envelope = envelope(json!({
            "this": "failed",
            "because": "this thing is locked and requires a key",
        }));
        let err = unwrap_envelope::<Value>(envelope).unwrap_err();
        match err {
            Error::Application(reason) => {
                assert_eq!(reason, "this thing is locked and requires a key");
            }
            other => panic!("expected application error, got {:?}", other),
        }
    }

    #[test]
    fn unwrap_failed_envelope_stringifies_structured_reason() {
        let envelope = envelope(json!({
            "this": "failed",
            "because": {"code": 42},
        }));
        let err = unwrap_envelope::<Value>(envelope).unwrap_err();
        match err {
            Error::Application(reason) => assert_eq!(reason, r#"{"code":42}"#),
            other => panic!("expected application error, got {:?}", other),
        }
    }

    #[test]
    fn key_query_is_omitted_without_a_key() {
        assert!(key_query(None).is_empty());
        assert_eq!(key_query(Some("sekrit")), vec![("key", "sekrit")]);
    }
}
