//! Handshake credential verification.
//!
//! The token issuer is an external collaborator; this module only consumes
//! its output: an HS256 JWT carrying the user's id and display name,
//! delivered in a cookie on the WebSocket upgrade request. Verification
//! failure rejects the connection before any event handler attaches.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use ripple_core::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The handshake carried no credential cookie.
    #[error("Missing credential cookie")]
    MissingToken,

    /// The token is malformed or its signature does not verify.
    #[error("Invalid token")]
    InvalidToken,

    /// The token's expiry has passed.
    #[error("Token expired")]
    TokenExpired,
}

/// Claims the token issuer signs.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    id: String,
    /// Display name.
    username: String,
    /// Expiry (Unix timestamp).
    exp: i64,
}

/// Verifies handshake tokens against the issuer's shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    /// Create a verifier for the given HS256 secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify a token and return the identity it asserts.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, wrongly signed, or
    /// expired.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        Ok(Identity::new(data.claims.id, data.claims.username))
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}
