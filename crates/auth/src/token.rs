//! HS256 token codec.
//!
//! Tokens are compact JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! where the MAC is HMAC-SHA256 over the first two segments with a symmetric
//! secret. The secret is loaded once at process start; rotation is out of
//! scope.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use warden_core::{PrincipalId, Role};

use crate::claims::{Claims, TokenValidationError, validate_claims};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not decode into the expected three-segment shape.
    #[error("malformed token")]
    Malformed,

    /// The MAC does not match the payload.
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window")]
    InvalidTimeWindow,
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid => TokenError::NotYetValid,
            TokenValidationError::InvalidTimeWindow => TokenError::InvalidTimeWindow,
        }
    }
}

/// Verification seam for the request gate.
///
/// Handlers and middleware depend on this trait rather than on the concrete
/// codec so tests can inject fixture verifiers.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Symmetric HMAC-SHA256 token codec.
///
/// Stateless apart from the shared secret; signing and verification are pure
/// CPU work and safe to run concurrently without locking.
pub struct Hs256TokenCodec {
    secret: Vec<u8>,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    /// Issue a signed token for `principal` carrying a snapshot of `roles`.
    pub fn issue(
        &self,
        principal: &PrincipalId,
        roles: &[Role],
        ttl: Duration,
        issuer: &str,
    ) -> String {
        let now = Utc::now();
        self.issue_claims(&Claims {
            sub: principal.clone(),
            roles: roles.to_vec(),
            issued_at: now,
            expires_at: now + ttl,
            issuer: issuer.to_string(),
        })
    }

    /// Sign a fully-formed claim set.
    pub fn issue_claims(&self, claims: &Claims) -> String {
        let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_json =
            serde_json::to_vec(claims).expect("claims serialize to JSON infallibly");
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);

        let mut mac = self.mac();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{header_b64}.{claims_b64}.{sig_b64}")
    }
}

impl TokenVerifier for Hs256TokenCodec {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (header_b64, claims_b64, sig_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(TokenError::Malformed),
            };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| TokenError::Malformed)?;
        let header: Header =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        if header.alg != "HS256" || header.typ != "JWT" {
            return Err(TokenError::Malformed);
        }

        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;

        // MAC before any claim parsing; hmac's verify_slice compares in
        // constant time.
        let mut mac = self.mac();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

        validate_claims(&claims, now)?;
        Ok(claims)
    }
}
