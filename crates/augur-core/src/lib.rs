//! Core of the augur prediction relay: domain types, the port traits that
//! adapters implement, credential verification, and the dispatch/relay
//! logic driving one client turn from inbound message to streamed tokens.
//!
//! Transport concerns (the client-facing WebSocket server and the upstream
//! inference connection) live in the adapter crates.
#![deny(unused_crate_dependencies)]

pub mod auth;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod ports;
pub mod prompt;
pub mod registry;
pub mod relay;
pub mod retry;
pub mod settings;

// Re-export commonly used types for convenience
pub use auth::{Claims, CredentialVerifier};
pub use dispatch::Dispatcher;
pub use domain::{
    END_OF_RESPONSE, InboundRequest, OutboundFrame, StatusFrame, TokenFrame,
};
pub use error::{CredentialError, DispatchError, UpstreamError};
pub use ports::{
    EventLookup, EventLookupError, FrameSink, InferenceStream, PredictionRecord, PredictionStore,
    PredictionStoreError, SinkClosed,
};
pub use prompt::{ComposedPrompt, DEFAULT_MAX_TOKENS, EventContext};
pub use registry::{SessionId, SessionRegistry};
pub use relay::TokenRelay;
pub use retry::RetryPolicy;
pub use settings::{ConfigError, RelayConfig};

// Silence unused dev-dependency warnings for test-only tooling
#[cfg(test)]
use tokio_test as _;
