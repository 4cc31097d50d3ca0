//! Client connection sink port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::OutboundFrame;

/// The destination went away: the client disconnected or the egress
/// channel was dropped. Expected life-cycle event, not a relay defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("client connection closed")]
pub struct SinkClosed;

/// Write-side handle for one client connection.
///
/// Frames are delivered in call order; implementations must not reorder or
/// batch across sends. At most one relay task writes through a sink at a
/// time (enforced by the registry's turn guard).
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send(&self, frame: OutboundFrame) -> Result<(), SinkClosed>;
}
