//! Request gate: authentication and enforcement middleware.
//!
//! Every protected request walks the same pipeline: extract bearer token →
//! verify → attach typed principal context → enforce → admit or reject. Each
//! failure is terminal for the request; nothing is retried here.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use warden_auth::TokenVerifier;
use warden_core::Action;
use warden_infra::{EnforceError, Enforcer};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

#[derive(Clone)]
pub struct GateState {
    pub enforcer: Arc<Enforcer>,
}

/// Why the Authorization header could not be used.
///
/// Header-shape problems are reported distinctly; token verification
/// failures are collapsed into one caller-visible message so probing cannot
/// distinguish a bad signature from an expired token.
enum BearerError {
    MissingHeader,
    BadScheme,
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(BearerError::MissingHeader)?;

    let header = header.to_str().map_err(|_| BearerError::BadScheme)?;
    let token = header.strip_prefix("Bearer ").ok_or(BearerError::BadScheme)?;

    let token = token.trim();
    if token.is_empty() {
        return Err(BearerError::BadScheme);
    }

    Ok(token)
}

/// Unauthenticated → TokenVerified → RolesResolved.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(BearerError::MissingHeader) => {
            return json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "missing Authorization header",
            );
        }
        Err(BearerError::BadScheme) => {
            return json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Authorization header must be 'Bearer <token>'",
            );
        }
    };

    let claims = match state.verifier.verify(token, Utc::now()) {
        Ok(claims) => claims,
        Err(err) => {
            // Log the precise reason; the response stays opaque.
            tracing::debug!(error = %err, "token rejected");
            return json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "invalid or expired token",
            );
        }
    };

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.roles));

    next.run(req).await
}

/// RolesResolved → Admitted | Rejected.
///
/// Resource is the request path, action the HTTP method. Store failure is
/// surfaced as 503 — never mapped to allow or deny.
pub async fn enforce(State(state): State<GateState>, req: Request<Body>, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>() else {
        // Only reachable if the route tree is miswired (enforce without
        // authenticate in front).
        return json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "missing principal context",
        );
    };

    let roles = principal.roles().to_vec();
    let principal_id = principal.principal_id().clone();
    let resource = req.uri().path().to_string();
    let action = Action::new(req.method().as_str().to_string());

    match state
        .enforcer
        .is_allowed_for_roles(&roles, &resource, &action)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::debug!(
                principal = principal_id.as_str(),
                resource,
                action = action.as_str(),
                "request denied"
            );
            json_error(
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("no permission for {} {}", action, resource),
            )
        }
        Err(EnforceError::StoreUnavailable(msg)) => {
            tracing::error!(error = %msg, "policy store unavailable during enforcement");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "authorization backend unavailable",
            )
        }
        Err(err) => {
            tracing::error!(error = %err, "unexpected enforcement failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}
