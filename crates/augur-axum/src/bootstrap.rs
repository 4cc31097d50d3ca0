//! Server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together:
//! the upstream WebSocket client, the default collaborator implementations
//! and the credential verifier are all instantiated here and injected into
//! the dispatcher behind their ports.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use augur_core::auth::CredentialVerifier;
use augur_core::dispatch::Dispatcher;
use augur_core::ports::{EventLookup, InferenceStream, PredictionStore};
use augur_core::registry::SessionRegistry;
use augur_core::settings::RelayConfig;
use augur_upstream::UpstreamClient;

use crate::stores::{InMemoryPredictionStore, StaticEventSource};

/// Assembled services shared by all connection handlers.
pub struct RelayContext {
    pub dispatcher: Dispatcher,
    pub registry: Arc<SessionRegistry>,
}

/// Wire the dispatcher and its collaborators from configuration.
#[must_use]
pub fn build_context(config: &RelayConfig) -> RelayContext {
    let registry = Arc::new(SessionRegistry::new());

    let upstream: Arc<dyn InferenceStream> =
        Arc::new(UpstreamClient::new(config.upstream_url(), config.retry));
    let events: Arc<dyn EventLookup> = Arc::new(StaticEventSource::new(config.event_key.clone()));
    let store: Arc<dyn PredictionStore> = Arc::new(InMemoryPredictionStore::new());
    let verifier = CredentialVerifier::new(&config.signing_secret, config.token_lifetime_minutes);

    let dispatcher = Dispatcher::new(
        config.api_secret.clone(),
        verifier,
        Arc::clone(&registry),
        events,
        upstream,
        store,
    );

    RelayContext {
        dispatcher,
        registry,
    }
}

/// Start the relay server on the configured listen address.
pub async fn start_server(config: RelayConfig) -> Result<()> {
    let ctx = build_context(&config);
    let app = crate::routes::create_router(ctx);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        upstream = %config.upstream_url(),
        "prediction relay listening on ws://{}/ws",
        config.bind_addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}
