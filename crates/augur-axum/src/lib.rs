//! Axum WebSocket server adapter for the augur prediction relay.
//!
//! Exposes the client-facing `/ws` endpoint, bridges accepted connections
//! to the core dispatcher through a channel-backed frame sink, and wires
//! the whole service together in [`bootstrap`].
#![deny(unused_crate_dependencies)]

// Used by the `augur` binary entry point.
use dotenvy as _;
use tracing_subscriber as _;

// Silence unused dev-dependency warnings for the integration tests.
#[cfg(test)]
use tokio_tungstenite as _;

pub mod bootstrap;
pub mod routes;
pub mod sink;
pub mod state;
pub mod stores;
pub mod ws;

pub use bootstrap::{RelayContext, build_context, start_server};
pub use routes::create_router;
pub use sink::ChannelFrameSink;
pub use state::AppState;
pub use stores::{InMemoryPredictionStore, StaticEventSource};
