//! # Streaming listener
//!
//! This module implements the real-time subscription engine for
//! `/listen/for/dweets/from/{thing}`. The service delivers events over a
//! long-lived chunked HTTP response; each logical event occupies a two-line
//! frame whose second line is a JSON-encoded value. That value is frequently
//! itself a JSON-encoded string and must then be decoded a second time to
//! reach the final structural payload.
//!
//! The parser accumulates received bytes until the frame's second line
//! parses as a complete JSON value, emits the decoded event, and clears the
//! buffer. Dropped connections are reconnected transparently: the listener
//! swallows read errors and end-of-stream, opens a fresh connection, and
//! keeps going. The overall elapsed-time budget is recorded once, when the
//! listener is created, and is never reset by a reconnect; when it runs out
//! the sequence ends normally (no error).

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Attempts to extract the event payload from the accumulation buffer.
///
/// Returns `None` while the buffer does not yet hold a complete frame:
/// fewer than two lines, a second line that is not yet valid JSON, or a
/// trailing UTF-8 sequence still waiting for its remaining bytes (chunk
/// boundaries can land mid-character).
fn parse_buffered_event(buffer: &[u8]) -> Option<Value> {
    let text = std::str::from_utf8(buffer).ok()?;
    let line = text.lines().nth(1)?;
    serde_json::from_str(line).ok()
}

/// Resolves a parsed frame value to the final event payload.
///
/// String-typed payloads are double-encoded by the service and get a second
/// decode pass; any other type is already the final value. A string whose
/// contents are not valid JSON yields `None` and the frame is dropped.
fn decode_event(value: Value) -> Option<Value> {
    match value {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        other => Some(other),
    }
}

/// Listener state machine.
enum ListenState {
    /// About to open a fresh connection.
    Connecting,
    /// Consuming the chunked response body.
    Streaming(BoxStream<'static, reqwest::Result<Bytes>>),
    /// A transient failure occurred; reconnect on the next turn.
    ReconnectPending,
    /// The elapsed-time budget ran out; the sequence ended normally.
    Done,
    /// A fatal error was surfaced; the sequence is over.
    Failed,
}

/// A live subscription to dweets for a single thing.
///
/// Created by [`crate::dweet::Dweet::listen_for_dweets_from`]. Pull events
/// with [`DweetListener::next`], or adapt the listener into a
/// [`futures::Stream`] with [`DweetListener::into_stream`]. Dropping the
/// listener closes the underlying connection.
pub struct DweetListener {
    client: Client,
    url: String,
    query: Vec<(String, String)>,
    timeout: Option<Duration>,
    started: Instant,
    buffer: Vec<u8>,
    state: ListenState,
    debug: bool,
}

impl DweetListener {
    pub(crate) fn new(
        client: Client,
        url: String,
        query: Vec<(String, String)>,
        timeout: Option<Duration>,
        debug: bool,
    ) -> Self {
        Self {
            client,
            url,
            query,
            timeout,
            started: Instant::now(),
            buffer: Vec::new(),
            state: ListenState::Connecting,
            debug,
        }
    }

    /// Overrides the elapsed-time budget for this subscription.
    ///
    /// `None` listens indefinitely. The budget is measured from the moment
    /// the listener was created, so call this before the first poll.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn remaining_budget(&self) -> Option<Duration> {
        self.timeout
            .map(|budget| budget.saturating_sub(self.started.elapsed()))
    }

    fn budget_exhausted(&self) -> bool {
        matches!(self.remaining_budget(), Some(left) if left.is_zero())
    }

    /// Returns the next decoded event.
    ///
    /// `None` signals the end of the sequence: either the elapsed-time
    /// budget ran out (normal termination) or a fatal error was already
    /// yielded. Transient connection failures never show up here; the
    /// listener reconnects on its own without touching the budget clock.
    ///
    /// Not cancellation-safe: dropping the returned future mid-poll tears
    /// down the session. Stop pulling (or drop the listener) to cancel.
    pub async fn next(&mut self) -> Option<Result<Value>> {
        loop {
            if self.budget_exhausted() {
                self.state = ListenState::Done;
            }
            match std::mem::replace(&mut self.state, ListenState::Done) {
                ListenState::Done => return None,
                ListenState::Failed => {
                    self.state = ListenState::Failed;
                    return None;
                }
                ListenState::ReconnectPending => {
                    if self.debug {
                        eprintln!("listener reconnecting to {}", self.url);
                    }
                    self.buffer.clear();
                    self.state = ListenState::Connecting;
                }
                ListenState::Connecting => {
                    let mut req = self.client.get(&self.url);
                    if !self.query.is_empty() {
                        req = req.query(&self.query);
                    }
                    // The per-request timeout hint is the *remaining* budget,
                    // so a healthy but quiet connection cannot outlive it.
                    if let Some(left) = self.remaining_budget() {
                        req = req.timeout(left);
                    }
                    match req.send().await {
                        Ok(resp) if resp.status().is_success() => {
                            self.state = ListenState::Streaming(resp.bytes_stream().boxed());
                        }
                        Ok(resp) => {
                            self.state = ListenState::Failed;
                            return Some(Err(Error::Http(resp.status())));
                        }
                        Err(err) if err.is_timeout() => {
                            // Budget ran out mid-connect; the loop head turns
                            // this into a normal end of sequence.
                            self.state = ListenState::ReconnectPending;
                        }
                        Err(err) => {
                            self.state = ListenState::Failed;
                            return Some(Err(err.into()));
                        }
                    }
                }
                ListenState::Streaming(mut chunks) => match chunks.next().await {
                    Some(Ok(chunk)) => {
                        self.state = ListenState::Streaming(chunks);
                        if chunk.is_empty() {
                            continue;
                        }
                        self.buffer.extend_from_slice(&chunk);
                        if let Some(value) = parse_buffered_event(&self.buffer) {
                            self.buffer.clear();
                            match decode_event(value) {
                                Some(event) => return Some(Ok(event)),
                                None => {
                                    if self.debug {
                                        eprintln!("listener dropped an undecodable frame");
                                    }
                                }
                            }
                        }
                    }
                    Some(Err(err)) => {
                        if self.debug {
                            eprintln!("listener connection error (will reconnect): {}", err);
                        }
                        self.state = ListenState::ReconnectPending;
                    }
                    None => {
                        // Server closed the stream; treat like any other drop.
                        self.state = ListenState::ReconnectPending;
                    }
                },
            }
        }
    }

    /// Adapts the listener into a pull-driven [`futures::Stream`] of events.
    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> + Send {
        stream::unfold(self, |mut listener| async move {
            listener.next().await.map(|event| (event, listener))
        })
    }
}
