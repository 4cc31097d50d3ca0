//! WebSocket client adapter for the inference backend.
//!
//! Implements the core's [`augur_core::ports::InferenceStream`] port: one
//! transient connection per turn, a composed prompt sent on open, and
//! bounded reconnect/re-read retries around the token batch.

pub mod client;
pub mod connector;

pub use client::UpstreamClient;
pub use connector::{BackendConnector, BackendSession, ConnectError, WsConnector};
