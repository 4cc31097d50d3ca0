//! Wire-level domain types for the prediction relay.
//!
//! Inbound client messages arrive as a `{"data": {...}}` envelope over the
//! WebSocket. Outbound traffic is either a single status frame (pre-relay
//! failures) or a run of token frames terminated by the
//! [`END_OF_RESPONSE`] sentinel.

use serde::{Deserialize, Serialize};

/// Terminal token value marking the end of a streamed response.
pub const END_OF_RESPONSE: &str = "END_OF_RESPONSE";

/// Raw inbound envelope as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub data: RequestData,
}

/// Payload of the inbound envelope. Every field defaults to empty so the
/// dispatcher can distinguish "missing" from "present" with uniform guards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestData {
    pub prompt: String,
    pub address: String,
    pub team: String,
    pub token: String,
    pub api_key_auth: String,
}

/// A validated-shape inbound request, transient for one dispatch call.
///
/// Field-level invariants (non-empty prompt/credential, matching api key)
/// are enforced by the dispatcher state machine, not at parse time.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub prompt: String,
    pub credential: String,
    pub api_key: String,
    /// Submitter wallet address, when the client provided one.
    pub address: Option<String>,
    /// Optional event selector overriding the configured current event.
    pub event_selector: Option<String>,
}

impl InboundRequest {
    /// Decode one raw client message. Fails only on malformed JSON; absent
    /// fields parse as empty strings and are rejected later with specific
    /// status bodies.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        let data = envelope.data;
        Ok(Self {
            prompt: data.prompt,
            credential: data.token,
            api_key: data.api_key_auth,
            address: non_empty(data.address),
            event_selector: non_empty(data.team),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Pre-relay status/error frame: `{"statusCode": int, "body": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFrame {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Streaming frame: `{"token": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFrame {
    pub token: String,
}

impl TokenFrame {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The synthetic frame closing a streamed turn.
    #[must_use]
    pub fn end_of_response() -> Self {
        Self::new(END_OF_RESPONSE)
    }

    /// True for the end-of-stream sentinel.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.token == END_OF_RESPONSE
    }
}

/// Any frame written back to a client connection.
///
/// Serializes untagged so the wire shape stays exactly `{"statusCode",..}`
/// or `{"token":..}` with no enum wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Status(StatusFrame),
    Token(TokenFrame),
}

impl OutboundFrame {
    pub fn token(value: impl Into<String>) -> Self {
        Self::Token(TokenFrame::new(value))
    }

    #[must_use]
    pub fn end_of_response() -> Self {
        Self::Token(TokenFrame::end_of_response())
    }
}
