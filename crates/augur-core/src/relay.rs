//! Token relay: drains one upstream session into one client connection.
//!
//! Ordering guarantee: tokens reach the destination in upstream arrival
//! order, one frame per token, terminated by exactly one
//! `END_OF_RESPONSE` frame. Upstream failures surface as a single status
//! frame instead — a totally silent backend never produces a bare
//! terminator.
//!
//! A destination that closed mid-stream aborts the relay silently; a
//! disconnected client is an expected life-cycle event, not a relay
//! defect.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::OutboundFrame;
use crate::error::DispatchError;
use crate::ports::{FrameSink, InferenceStream, PredictionStore, PredictionStoreError};
use crate::prompt::ComposedPrompt;
use crate::registry::{SessionId, SessionRegistry};

/// One relay turn bound to a single client session.
pub struct TokenRelay {
    pub upstream: Arc<dyn InferenceStream>,
    pub store: Arc<dyn PredictionStore>,
    pub registry: Arc<SessionRegistry>,
    pub sink: Arc<dyn FrameSink>,
    pub session: SessionId,
}

impl TokenRelay {
    /// Run the upstream session and forward its tokens to the client.
    ///
    /// Never returns an error: every failure either becomes one status
    /// frame on the destination or is swallowed because the destination is
    /// gone.
    pub async fn run(
        &self,
        prompt: ComposedPrompt,
        event_key: &str,
        submitter: Option<&str>,
    ) {
        let tokens = match self.upstream.stream(prompt).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(session = %self.session, %err, "upstream session failed");
                self.send_checked(OutboundFrame::Status(DispatchError::from(err).to_frame()))
                    .await;
                return;
            }
        };

        for token in &tokens {
            // Cheap cancellation check; the race with a concurrent
            // disconnect is tolerated as a no-op send failure below.
            if !self.registry.is_active(self.session) {
                debug!(session = %self.session, "client disconnected mid-stream, aborting relay");
                return;
            }
            if !self.send_checked(OutboundFrame::token(token.clone())).await {
                return;
            }
        }

        if !self.send_checked(OutboundFrame::end_of_response()).await {
            return;
        }

        if let Some(submitter) = submitter {
            self.record_prediction(event_key, submitter, &tokens.concat())
                .await;
        }
    }

    /// Persist the completed prediction. Store outcomes never reach the
    /// client; conflicts and failures are only logged.
    async fn record_prediction(&self, event_key: &str, submitter: &str, prediction: &str) {
        match self.store.record(event_key, submitter, prediction).await {
            Ok(record) => {
                debug!(
                    session = %self.session,
                    event = %record.event_key,
                    submitter = %record.submitter,
                    "prediction recorded"
                );
            }
            Err(PredictionStoreError::AlreadyRecorded) => {
                warn!(
                    session = %self.session,
                    event = event_key,
                    submitter,
                    "prediction already recorded for this event"
                );
            }
            Err(err) => {
                warn!(session = %self.session, %err, "failed to record prediction");
            }
        }
    }

    /// Send one frame; false means the destination is gone and the relay
    /// should stop.
    async fn send_checked(&self, frame: OutboundFrame) -> bool {
        match self.sink.send(frame).await {
            Ok(()) => true,
            Err(_closed) => {
                debug!(session = %self.session, "dropping frame for closed client connection");
                false
            }
        }
    }
}
