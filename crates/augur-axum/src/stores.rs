//! Default collaborator implementations wired in at the composition root.
//!
//! [`StaticEventSource`] serves the event key configured at startup (or the
//! client-requested selector); [`InMemoryPredictionStore`] keeps one record
//! per event and submitter for the lifetime of the process. Deployments
//! with a real event schedule or durable storage swap these out behind the
//! same ports.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use augur_core::ports::{
    EventLookup, EventLookupError, PredictionRecord, PredictionStore, PredictionStoreError,
};
use augur_core::prompt::EventContext;

/// Event lookup backed by a single configured event key.
///
/// A client-supplied selector takes precedence over the configured key, so
/// test harnesses and multi-event clients can target a specific event.
pub struct StaticEventSource {
    configured: Option<String>,
}

impl StaticEventSource {
    #[must_use]
    pub const fn new(configured: Option<String>) -> Self {
        Self { configured }
    }
}

#[async_trait]
impl EventLookup for StaticEventSource {
    async fn current_event(
        &self,
        selector: Option<String>,
    ) -> Result<Option<EventContext>, EventLookupError> {
        Ok(selector
            .or_else(|| self.configured.clone())
            .map(EventContext::with_default_prompts))
    }
}

/// Process-local prediction store keyed by (event, submitter).
#[derive(Debug, Default)]
pub struct InMemoryPredictionStore {
    records: Mutex<HashMap<(String, String), PredictionRecord>>,
}

impl InMemoryPredictionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PredictionStore for InMemoryPredictionStore {
    async fn record(
        &self,
        event_key: &str,
        submitter: &str,
        prediction: &str,
    ) -> Result<PredictionRecord, PredictionStoreError> {
        let mut records = self.records.lock().unwrap();
        let key = (event_key.to_owned(), submitter.to_owned());
        if records.contains_key(&key) {
            return Err(PredictionStoreError::AlreadyRecorded);
        }
        let record = PredictionRecord {
            event_key: event_key.to_owned(),
            submitter: submitter.to_owned(),
            prediction: prediction.to_owned(),
            recorded_at: Utc::now(),
        };
        records.insert(key, record.clone());
        debug!(event = event_key, submitter, "prediction recorded");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selector_overrides_configured_event() {
        let source = StaticEventSource::new(Some("DAILY".into()));

        let picked = source
            .current_event(Some("FINALS".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.event_key, "FINALS");

        let fallback = source.current_event(None).await.unwrap().unwrap();
        assert_eq!(fallback.event_key, "DAILY");
    }

    #[tokio::test]
    async fn unconfigured_source_without_selector_has_no_event() {
        let source = StaticEventSource::new(None);
        assert_eq!(source.current_event(None).await, Ok(None));
    }

    #[tokio::test]
    async fn store_rejects_second_prediction_for_same_slot() {
        let store = InMemoryPredictionStore::new();

        let record = store.record("EVENT", "0xabc", "heads").await.unwrap();
        assert_eq!(record.prediction, "heads");

        assert_eq!(
            store.record("EVENT", "0xabc", "tails").await,
            Err(PredictionStoreError::AlreadyRecorded)
        );

        // A different submitter still gets a slot.
        store.record("EVENT", "0xdef", "tails").await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
