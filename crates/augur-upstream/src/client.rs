//! Upstream inference client: bounded outer/inner retry engine.
//!
//! The outer loop owns "cannot reach backend" (reconnect attempts); the
//! inner loop owns "reached backend but it produced nothing yet" (re-read
//! attempts on the same connection). Collapsing them would lose the
//! distinction between a network failure and a slow or idle model, so the
//! two budgets are tracked separately.

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use augur_core::error::UpstreamError;
use augur_core::ports::InferenceStream;
use augur_core::prompt::ComposedPrompt;
use augur_core::retry::RetryPolicy;

use crate::connector::{BackendConnector, BackendSession, ConnectError, WsConnector};

/// Single-shot upstream session driver implementing the core's
/// [`InferenceStream`] port.
pub struct UpstreamClient<C: BackendConnector> {
    connector: C,
    policy: RetryPolicy,
}

impl UpstreamClient<WsConnector> {
    /// Client dialing `url` with the given retry policy.
    #[must_use]
    pub fn new(url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self::with_connector(WsConnector::new(url), policy)
    }
}

impl<C: BackendConnector> UpstreamClient<C> {
    /// Client over an injected connection layer (used by tests).
    #[must_use]
    pub const fn with_connector(connector: C, policy: RetryPolicy) -> Self {
        Self { connector, policy }
    }

    /// Connect and deliver the opening prompt, under the outer budget.
    ///
    /// A send failure right after connecting consumes an outer attempt and
    /// reopens the connection, same as a refused dial.
    async fn open_session(&self, payload: &str) -> Result<Box<dyn BackendSession>, UpstreamError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_open(payload).await {
                Ok(session) => return Ok(session),
                Err(err) => {
                    warn!(
                        attempt,
                        max = self.policy.max_outer_attempts,
                        %err,
                        "unable to reach inference backend"
                    );
                    if attempt >= self.policy.max_outer_attempts {
                        return Err(UpstreamError::BackendUnreachable);
                    }
                    sleep(self.policy.delay).await;
                }
            }
        }
    }

    async fn try_open(&self, payload: &str) -> Result<Box<dyn BackendSession>, ConnectError> {
        let mut session = self.connector.connect().await?;
        session.send_text(payload.to_owned()).await?;
        Ok(session)
    }

    /// Read one batch: all messages currently arriving on the session.
    ///
    /// The drain ends when the backend closes, a read errors, or the idle
    /// window (one retry delay) elapses with nothing new. A read error
    /// discards the partial batch so the attempt counts as empty.
    async fn drain_batch(&self, session: &mut dyn BackendSession) -> Vec<String> {
        let mut batch = Vec::new();
        loop {
            match timeout(self.policy.delay, session.next_message()).await {
                Ok(Ok(Some(token))) => batch.push(token),
                // Backend closed the session; the batch is complete.
                Ok(Ok(None)) => return batch,
                Ok(Err(err)) => {
                    warn!(
                        received = batch.len(),
                        %err,
                        "read error from inference backend, discarding batch"
                    );
                    return Vec::new();
                }
                // Idle window elapsed.
                Err(_) => return batch,
            }
        }
    }
}

#[async_trait]
impl<C: BackendConnector> InferenceStream for UpstreamClient<C> {
    async fn stream(&self, prompt: ComposedPrompt) -> Result<Vec<String>, UpstreamError> {
        let payload = prompt.to_payload();
        let mut session = self.open_session(&payload).await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let batch = self.drain_batch(session.as_mut()).await;
            if !batch.is_empty() {
                debug!(tokens = batch.len(), "upstream session produced a batch");
                return Ok(batch);
            }
            if attempt >= self.policy.max_inner_attempts {
                warn!(
                    attempts = attempt,
                    "inference backend produced no tokens, giving up"
                );
                return Err(UpstreamError::EmptyUpstreamResponse);
            }
            debug!(attempt, "no tokens received from inference backend, retrying read");
            sleep(self.policy.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::Instant;

    use augur_core::prompt::EventContext;

    use super::*;

    /// What a scripted session yields on successive reads.
    #[derive(Clone)]
    enum Read {
        Token(&'static str),
        Closed,
        Error,
    }

    struct ScriptedSession {
        reads: VecDeque<Read>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BackendSession for ScriptedSession {
        async fn send_text(&mut self, payload: String) -> Result<(), ConnectError> {
            self.sent.lock().unwrap().push(payload);
            Ok(())
        }

        async fn next_message(&mut self) -> Result<Option<String>, ConnectError> {
            match self.reads.pop_front() {
                Some(Read::Token(token)) => Ok(Some(token.to_owned())),
                Some(Read::Error) => Err(ConnectError("connection reset".into())),
                Some(Read::Closed) | None => Ok(None),
            }
        }
    }

    /// Refuses the first `refuse` dials, then serves the scripted reads.
    /// The shared counters stay observable after the connector moves into
    /// the client.
    struct ScriptedConnector {
        refuse: u32,
        attempts: Arc<AtomicU32>,
        reads: Arc<Mutex<VecDeque<Read>>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedConnector {
        fn new(refuse: u32, reads: Vec<Read>) -> Self {
            Self {
                refuse,
                attempts: Arc::new(AtomicU32::new(0)),
                reads: Arc::new(Mutex::new(reads.into())),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn refusing() -> Self {
            Self::new(u32::MAX, Vec::new())
        }
    }

    #[async_trait]
    impl BackendConnector for ScriptedConnector {
        async fn connect(&self) -> Result<Box<dyn BackendSession>, ConnectError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.refuse {
                return Err(ConnectError("connection refused".into()));
            }
            Ok(Box::new(ScriptedSession {
                reads: std::mem::take(&mut *self.reads.lock().unwrap()),
                sent: Arc::clone(&self.sent),
            }))
        }
    }

    fn prompt() -> ComposedPrompt {
        ComposedPrompt::compose("q", &EventContext::with_default_prompts("EVENT"))
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_backend_makes_exactly_max_outer_attempts() {
        let connector = ScriptedConnector::refusing();
        let attempts = Arc::clone(&connector.attempts);
        let delay = Duration::from_secs(5);
        let client = UpstreamClient::with_connector(connector, RetryPolicy::new(3, 3, delay));

        let started = Instant::now();
        let result = client.stream(prompt()).await;

        assert_eq!(result, Err(UpstreamError::BackendUnreachable));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Attempts are separated by the retry delay, with no trailing sleep.
        assert_eq!(started.elapsed(), delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_succeeds_after_transient_refusals() {
        let connector = ScriptedConnector::new(
            2,
            vec![Read::Token("foo"), Read::Token("bar"), Read::Closed],
        );
        let attempts = Arc::clone(&connector.attempts);
        let client =
            UpstreamClient::with_connector(connector, RetryPolicy::new(3, 3, Duration::from_secs(1)));

        let tokens = client.stream(prompt()).await.unwrap();

        assert_eq!(tokens, vec!["foo".to_owned(), "bar".to_owned()]);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn prompt_payload_is_sent_exactly_once() {
        let connector = ScriptedConnector::new(0, vec![Read::Token("foo"), Read::Closed]);
        let sent = Arc::clone(&connector.sent);
        let client = UpstreamClient::with_connector(connector, RetryPolicy::immediate(3, 3));

        client.stream(prompt()).await.unwrap();

        let sent = sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(payload["user_prompt"], "q");
        assert_eq!(payload["max_tokens"], 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_backend_exhausts_inner_attempts_without_reconnect() {
        // The session opens fine but closes with zero tokens; every drain
        // observes an empty batch.
        let connector = ScriptedConnector::new(0, Vec::new());
        let attempts = Arc::clone(&connector.attempts);
        let delay = Duration::from_secs(5);
        let client = UpstreamClient::with_connector(connector, RetryPolicy::new(3, 3, delay));

        let result = client.stream(prompt()).await;

        assert_eq!(result, Err(UpstreamError::EmptyUpstreamResponse));
        // Inner retries stay on the same connection.
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_on_a_later_inner_attempt_succeed() {
        // First read reports "nothing yet" (closed with no tokens), the
        // retry picks the tokens up.
        let connector = ScriptedConnector::new(
            0,
            vec![Read::Closed, Read::Token("foo"), Read::Closed],
        );
        let attempts = Arc::clone(&connector.attempts);
        let client = UpstreamClient::with_connector(
            connector,
            RetryPolicy::new(3, 3, Duration::from_secs(1)),
        );

        let tokens = client.stream(prompt()).await.unwrap();

        assert_eq!(tokens, vec!["foo".to_owned()]);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn read_error_counts_as_empty_batch() {
        // An error mid-batch discards the partial tokens; subsequent reads
        // yield nothing, so the inner budget runs out.
        let connector = ScriptedConnector::new(0, vec![Read::Token("lost"), Read::Error]);
        let attempts = Arc::clone(&connector.attempts);
        let client = UpstreamClient::with_connector(
            connector,
            RetryPolicy::new(3, 2, Duration::from_secs(1)),
        );

        let result = client.stream(prompt()).await;

        assert_eq!(result, Err(UpstreamError::EmptyUpstreamResponse));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
