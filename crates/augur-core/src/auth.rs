//! Credential verification.
//!
//! Bearer credentials are HS256-signed claims over a shared secret. The
//! verifier is a pure function of that secret and the current instant; it
//! must run before any upstream work is started so unauthenticated calls
//! never consume backend capacity.
//!
//! One verifier instance serves every entry path that checks credentials.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// Decoded payload of a verified credential. Local value only, never
/// persisted by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier: the submitter's wallet address.
    pub wallet_address: String,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

/// HS256 signed-claim verifier and issuer.
pub struct CredentialVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl CredentialVerifier {
    /// Build a verifier over the configured signing secret.
    ///
    /// `lifetime_minutes` only affects [`issue`](Self::issue); verification
    /// trusts the `exp` claim embedded in the credential.
    #[must_use]
    pub fn new(signing_secret: &str, lifetime_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(signing_secret.as_bytes()),
            decoding: DecodingKey::from_secret(signing_secret.as_bytes()),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    /// Validate signature and expiry, returning the decoded claims.
    pub fn verify(&self, credential: &str) -> Result<Claims, CredentialError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(credential, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::Malformed,
            })
    }

    /// Issue a credential for `wallet_address` with the configured lifetime.
    pub fn issue(&self, wallet_address: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            wallet_address: wallet_address.to_owned(),
            exp: (Utc::now() + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new("test-signing-secret", 60)
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let verifier = verifier();
        let credential = verifier.issue("0xdeadbeef").unwrap();
        let claims = verifier.verify(&credential).unwrap();
        assert_eq!(claims.wallet_address, "0xdeadbeef");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_credential_is_rejected_as_expired() {
        let verifier = verifier();
        // Sign an exp well past the default validation leeway.
        let claims = Claims {
            wallet_address: "0xdeadbeef".into(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let credential = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-signing-secret"),
        )
        .unwrap();

        assert_eq!(verifier.verify(&credential), Err(CredentialError::Expired));
    }

    #[test]
    fn garbage_credential_is_malformed() {
        assert_eq!(
            verifier().verify("not-a-credential"),
            Err(CredentialError::Malformed)
        );
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let other = CredentialVerifier::new("another-secret", 60);
        let credential = other.issue("0xdeadbeef").unwrap();
        assert_eq!(
            verifier().verify(&credential),
            Err(CredentialError::Malformed)
        );
    }
}
