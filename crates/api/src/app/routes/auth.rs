//! Authentication endpoints: register, login, profile.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use warden_core::{DomainError, DomainResult, PrincipalId, Role};
use warden_infra::{UserRecord, hash_password, verify_password};

use crate::app::dto::{LoginRequest, LoginResponse, RegisterRequest, UserDto};
use crate::app::errors::{self, json_error};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Role granted explicitly at account creation. Login never invents a
/// fallback role; an account with no grants has an empty effective set.
const DEFAULT_ROLE: &str = "user";

fn validate_registration(req: &RegisterRequest) -> DomainResult<()> {
    if req.username.len() < 3 || req.username.len() > 50 {
        return Err(DomainError::validation("username must be 3-50 characters"));
    }
    if !req.email.contains('@') {
        return Err(DomainError::validation("email is not valid"));
    }
    if req.password.len() < 6 {
        return Err(DomainError::validation("password must be at least 6 characters"));
    }
    Ok(())
}

/// POST /api/auth/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<RegisterRequest>,
) -> axum::response::Response {
    if let Err(err) = validate_registration(&req) {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string());
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!(error = %err, "password hashing failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            );
        }
    };

    let user = UserRecord {
        username: req.username,
        email: req.email,
        display_name: req.display_name,
        password_hash,
        active: true,
        created_at: Utc::now(),
    };

    if let Err(err) = services.users.create(&user).await {
        return errors::store_error_to_response(err);
    }

    // Explicit default grant; see the role-graph contract on empty grants.
    let principal = PrincipalId::new(user.username.clone());
    if let Err(err) = services
        .enforcer
        .grant_role(&principal, &Role::new(DEFAULT_ROLE))
        .await
    {
        return errors::enforce_error_to_response(err);
    }

    tracing::info!(username = %user.username, "user registered");
    (StatusCode::OK, Json(serde_json::json!({ "user": UserDto::from(&user) }))).into_response()
}

/// POST /api/auth/login
///
/// Unknown username and wrong password produce the same response, so the
/// endpoint cannot be used to probe for accounts.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<LoginRequest>,
) -> axum::response::Response {
    let user = match services.users.find_by_username(&req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid username or password",
            );
        }
        Err(err) => return errors::store_error_to_response(err),
    };

    if !verify_password(&user.password_hash, &req.password) {
        return json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        );
    }

    if !user.active {
        return json_error(StatusCode::FORBIDDEN, "account_disabled", "account is disabled");
    }

    let principal = PrincipalId::new(user.username.clone());
    let roles = match services.enforcer.direct_roles(&principal).await {
        Ok(roles) => roles,
        Err(err) => return errors::enforce_error_to_response(err),
    };

    let token = services
        .codec
        .issue(&principal, &roles, services.token_ttl, &services.issuer);

    tracing::info!(username = %user.username, "login succeeded");
    Json(LoginResponse {
        token,
        username: user.username,
        display_name: user.display_name,
        email: user.email,
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
    })
    .into_response()
}

/// GET /api/users/profile
///
/// Reports live-resolved effective roles, so a stale token snapshot is
/// visible to the caller before re-login.
pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let user = match services
        .users
        .find_by_username(principal.principal_id().as_str())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(err) => return errors::store_error_to_response(err),
    };

    let effective = match services.enforcer.effective_roles(principal.principal_id()).await {
        Ok(effective) => effective,
        Err(err) => return errors::enforce_error_to_response(err),
    };

    let mut roles: Vec<String> = effective.iter().map(|r| r.as_str().to_string()).collect();
    roles.sort();

    Json(serde_json::json!({
        "user": UserDto::from(&user),
        "roles": roles,
    }))
    .into_response()
}
