use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::{PrincipalId, Role};

/// Identity token claims (transport-agnostic).
///
/// The role list is a snapshot taken at issuance, not a live view: grants and
/// revocations after login only take effect once the principal obtains a new
/// token. There is no revocation list in this design; a token stays valid
/// until `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    /// Roles granted to the principal at issuance time.
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp (exclusive: a token is invalid *at* this instant).
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Issuer identifier.
    #[serde(rename = "iss")]
    pub issuer: String,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate token claims against a clock reading.
///
/// Note: this validates the *claims* only. Signature verification and
/// decoding live in [`crate::token`].
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims_between(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Claims {
        Claims {
            sub: PrincipalId::new("alice"),
            roles: vec![Role::new("user")],
            issued_at,
            expires_at,
            issuer: "warden".to_string(),
        }
    }

    #[test]
    fn valid_inside_window() {
        let now = Utc::now();
        let claims = claims_between(now - Duration::minutes(1), now + Duration::minutes(1));
        assert_eq!(validate_claims(&claims, now), Ok(()));
    }

    #[test]
    fn expiry_is_exclusive() {
        let now = Utc::now();
        let claims = claims_between(now - Duration::minutes(10), now);
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn rejects_token_from_the_future() {
        let now = Utc::now();
        let claims = claims_between(now + Duration::minutes(1), now + Duration::minutes(2));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn rejects_inverted_window() {
        let now = Utc::now();
        let claims = claims_between(now, now - Duration::minutes(1));
        assert_eq!(
            validate_claims(&claims, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
