//! Channel-backed frame sink.
//!
//! Relay tasks write [`OutboundFrame`]s through the [`FrameSink`] port;
//! the per-connection egress task drains the paired receiver and owns the
//! actual socket writes. Dropping the receiver (client gone) turns every
//! later send into [`SinkClosed`], which the relay treats as cancellation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use augur_core::domain::OutboundFrame;
use augur_core::ports::{FrameSink, SinkClosed};

/// Outbound queue depth per connection. Tokens are small; backpressure
/// here only matters when a client stops reading entirely.
const FRAME_QUEUE_DEPTH: usize = 64;

/// Write-side handle feeding one connection's egress task.
pub struct ChannelFrameSink {
    tx: mpsc::Sender<OutboundFrame>,
}

impl ChannelFrameSink {
    /// Create a sink plus the receiver the egress task drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(FRAME_QUEUE_DEPTH);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FrameSink for ChannelFrameSink {
    async fn send(&self, frame: OutboundFrame) -> Result<(), SinkClosed> {
        self.tx.send(frame).await.map_err(|_| SinkClosed)
    }
}
