//! Upstream inference port.

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::prompt::ComposedPrompt;

/// One single-shot token-streaming session against the inference backend.
///
/// Implementations own connection management and the bounded outer/inner
/// retry loops. The returned batch holds the tokens of the first non-empty
/// read, in arrival order; the session does not keep streaming past it.
/// The end-of-stream sentinel is injected by the relay, not the port.
#[async_trait]
pub trait InferenceStream: Send + Sync {
    async fn stream(&self, prompt: ComposedPrompt) -> Result<Vec<String>, UpstreamError>;
}
