//! Collaborator ports: event lookup and prediction persistence.
//!
//! Both are external concerns the relay core only consumes. Storage layout
//! and lookup mechanics are out of scope here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::prompt::EventContext;

/// Failure inside the event-lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event lookup failed: {0}")]
pub struct EventLookupError(pub String);

/// Supplies the context (event plus prompt templates) predictions are made
/// against.
#[async_trait]
pub trait EventLookup: Send + Sync {
    /// Current event context, or `None` when nothing is scheduled.
    ///
    /// `selector` optionally narrows the lookup to a specific event
    /// requested by the client.
    async fn current_event(
        &self,
        selector: Option<String>,
    ) -> Result<Option<EventContext>, EventLookupError>;
}

/// A stored prediction record, as acknowledged by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub event_key: String,
    pub submitter: String,
    pub prediction: String,
    pub recorded_at: DateTime<Utc>,
}

/// Failures from the prediction-store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionStoreError {
    /// One record per (event, submitter): the slot is already taken.
    #[error("prediction already recorded for this submitter")]
    AlreadyRecorded,

    #[error("prediction store failure: {0}")]
    Storage(String),
}

/// Records completed predictions. Conflicts are reported, never retried.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn record(
        &self,
        event_key: &str,
        submitter: &str,
        prediction: &str,
    ) -> Result<PredictionRecord, PredictionStoreError>;
}
