//! Port definitions: the traits at the seams between the relay core and
//! its transports/collaborators.
//!
//! Concrete implementations live in adapter crates (`augur-upstream`,
//! `augur-axum`); tests inject hand-written fakes.

mod collaborators;
mod inference;
mod sink;

pub use collaborators::{
    EventLookup, EventLookupError, PredictionRecord, PredictionStore, PredictionStoreError,
};
pub use inference::InferenceStream;
pub use sink::{FrameSink, SinkClosed};
