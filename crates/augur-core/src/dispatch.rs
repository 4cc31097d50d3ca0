//! Inbound message dispatcher.
//!
//! Drives each raw client message through the validation state machine
//! (parse → api-key check → field validation → credential verification →
//! event lookup) and, on success, spawns a supervised relay task bound to
//! the originating session. Rejections write exactly one status frame;
//! nothing propagates past the dispatcher boundary.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::auth::CredentialVerifier;
use crate::domain::{InboundRequest, OutboundFrame};
use crate::error::DispatchError;
use crate::ports::{EventLookup, FrameSink, InferenceStream, PredictionStore};
use crate::prompt::ComposedPrompt;
use crate::registry::{SessionId, SessionRegistry};
use crate::relay::TokenRelay;

/// Per-message dispatcher, shared across all connection tasks.
pub struct Dispatcher {
    api_secret: String,
    verifier: CredentialVerifier,
    registry: Arc<SessionRegistry>,
    events: Arc<dyn EventLookup>,
    upstream: Arc<dyn InferenceStream>,
    store: Arc<dyn PredictionStore>,
}

impl Dispatcher {
    pub fn new(
        api_secret: String,
        verifier: CredentialVerifier,
        registry: Arc<SessionRegistry>,
        events: Arc<dyn EventLookup>,
        upstream: Arc<dyn InferenceStream>,
        store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            api_secret,
            verifier,
            registry,
            events,
            upstream,
            store,
        }
    }

    /// Handle one raw inbound message for `session`.
    ///
    /// Infallible at this boundary: every rejection is converted into a
    /// status frame on `sink`. The relay work itself runs on a spawned
    /// task, so a slow or retrying upstream session never blocks message
    /// receipt for this or any other connection.
    pub async fn dispatch(&self, session: SessionId, raw: &str, sink: Arc<dyn FrameSink>) {
        if let Err(err) = self.try_dispatch(session, raw, Arc::clone(&sink)).await {
            debug!(session = %session, code = err.status_code(), %err, "rejecting inbound message");
            if sink.send(OutboundFrame::Status(err.to_frame())).await.is_err() {
                debug!(session = %session, "client gone before rejection frame was written");
            }
        }
    }

    async fn try_dispatch(
        &self,
        session: SessionId,
        raw: &str,
        sink: Arc<dyn FrameSink>,
    ) -> Result<(), DispatchError> {
        let request = InboundRequest::parse(raw)
            .map_err(|_| DispatchError::bad_request("Malformed request body"))?;

        // Guard order is part of the contract: shared secret first, then
        // field presence, then the credential itself.
        if request.api_key.is_empty() {
            return Err(DispatchError::bad_request("No api key provided"));
        }
        if request.api_key != self.api_secret {
            return Err(DispatchError::Unauthorized);
        }
        if request.prompt.is_empty() {
            return Err(DispatchError::bad_request("No prompt provided"));
        }
        if request.credential.is_empty() {
            return Err(DispatchError::bad_request("No token provided"));
        }

        // Verification happens before any upstream work so unauthenticated
        // calls never consume backend capacity.
        let claims = self.verifier.verify(&request.credential)?;

        let event = self
            .events
            .current_event(request.event_selector.clone())
            .await
            .unwrap_or_else(|err| {
                warn!(session = %session, %err, "event lookup failed");
                None
            })
            .ok_or(DispatchError::NoEventAvailable)?;

        if !self.registry.begin_turn(session) {
            return Err(DispatchError::bad_request(
                "Previous request still in progress",
            ));
        }

        let prompt = ComposedPrompt::compose(&request.prompt, &event);
        let submitter = request.address.or(Some(claims.wallet_address));
        self.spawn_relay(session, sink, prompt, event.event_key, submitter);
        Ok(())
    }

    /// Fire-and-forget relay task plus a supervisor that logs a panicking
    /// relay and releases the turn guard, so a crashed turn is discarded
    /// instead of wedging the connection.
    fn spawn_relay(
        &self,
        session: SessionId,
        sink: Arc<dyn FrameSink>,
        prompt: ComposedPrompt,
        event_key: String,
        submitter: Option<String>,
    ) {
        let relay = TokenRelay {
            upstream: Arc::clone(&self.upstream),
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            sink,
            session,
        };

        let handle = tokio::spawn(async move {
            relay
                .run(prompt, &event_key, submitter.as_deref())
                .await;
        });

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            match handle.await {
                Ok(()) => {}
                Err(err) if err.is_panic() => {
                    error!(session = %session, "relay task panicked, discarding turn");
                }
                Err(_) => {}
            }
            registry.end_turn(session);
        });
    }
}
