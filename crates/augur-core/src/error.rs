//! Relay error taxonomy and status-frame mappings.
//!
//! Every failure in the dispatch/relay path is converted into exactly one
//! outbound [`StatusFrame`] on the originating connection; nothing here is
//! allowed to terminate a connection task or the process.

use thiserror::Error;

use crate::domain::StatusFrame;

/// Credential verification failures.
///
/// The display strings are part of the wire contract: they are surfaced
/// verbatim as the body of a 498 status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Malformed,
}

/// Upstream inference session failures, after retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Outer (reconnect) attempts exhausted without a connection.
    #[error("Unable to reach inference backend")]
    BackendUnreachable,

    /// Inner (re-read) attempts exhausted without a single token.
    #[error("Inference backend returned no tokens")]
    EmptyUpstreamResponse,
}

/// Everything that can reject an inbound message or abort a relay turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Malformed envelope or missing required field.
    #[error("{0}")]
    BadRequest(String),

    /// Shared API secret missing the mark.
    #[error("Unauthorized")]
    Unauthorized,

    /// Expired or undecodable credential. Surfaced with the deliberate
    /// non-standard 498 code.
    #[error("{0}")]
    InvalidCredential(String),

    /// The event-lookup collaborator has no current context.
    #[error("No daily event found")]
    NoEventAvailable,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl DispatchError {
    /// Helper for the common missing/invalid-field rejections.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::BadRequest(body.into())
    }

    /// Status code carried in the rejection frame.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized => 401,
            Self::InvalidCredential(_) => 498,
            Self::NoEventAvailable => 404,
            Self::Upstream(UpstreamError::BackendUnreachable) => 503,
            Self::Upstream(UpstreamError::EmptyUpstreamResponse) => 504,
        }
    }

    /// Convert into the single frame written back to the client.
    #[must_use]
    pub fn to_frame(&self) -> StatusFrame {
        StatusFrame {
            status_code: self.status_code(),
            body: self.to_string(),
        }
    }
}

impl From<CredentialError> for DispatchError {
    fn from(err: CredentialError) -> Self {
        Self::InvalidCredential(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_wire_contract() {
        assert_eq!(DispatchError::bad_request("x").status_code(), 400);
        assert_eq!(DispatchError::Unauthorized.status_code(), 401);
        assert_eq!(
            DispatchError::from(CredentialError::Expired).status_code(),
            498
        );
        assert_eq!(DispatchError::NoEventAvailable.status_code(), 404);
        assert_eq!(
            DispatchError::from(UpstreamError::BackendUnreachable).status_code(),
            503
        );
        assert_eq!(
            DispatchError::from(UpstreamError::EmptyUpstreamResponse).status_code(),
            504
        );
    }

    #[test]
    fn expired_credential_frame_body() {
        let frame = DispatchError::from(CredentialError::Expired).to_frame();
        assert_eq!(frame.status_code, 498);
        assert_eq!(frame.body, "Token has expired");
    }

    #[test]
    fn malformed_credential_frame_body() {
        let frame = DispatchError::from(CredentialError::Malformed).to_frame();
        assert_eq!(frame.body, "Invalid token");
    }

    #[test]
    fn no_event_frame_body() {
        let frame = DispatchError::NoEventAvailable.to_frame();
        assert_eq!(frame.status_code, 404);
        assert_eq!(frame.body, "No daily event found");
    }
}
