//! # Dweet HTTP API
//!
//! This crate is a full-featured, idiomatic Rust client for the dweet.io
//! pub/sub messaging service. It supports:
//!
//! - Publishing dweets, to an unnamed or a named thing
//! - Reading the latest dweet or the stored history for a thing
//! - A live streaming listener (with auto-reconnection and an overall
//!   elapsed-time deadline)
//! - Locking and unlocking things, and removing locks outright
//! - Conditional alerts (set/get/remove)
//!
//! For usage examples, see `demos/simple.rs`.

pub mod config;
pub mod dweet;
pub mod error;
pub mod event;
pub mod listen;
pub mod utils;
