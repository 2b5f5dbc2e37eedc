//! User administration: listing, inspection, role grant/revoke.
//!
//! These handlers sit behind the enforcement middleware; by the time they
//! run, the policy check on (path, method) has already admitted the request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use warden_core::{PrincipalId, Role};

use crate::app::dto::{GrantRoleRequest, PageQuery, UserDto};
use crate::app::errors::{self, json_error};
use crate::app::services::AppServices;

/// GET /api/users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<PageQuery>,
) -> axum::response::Response {
    let (users, total) = match services.users.list(page.offset(), page.limit()).await {
        Ok(result) => result,
        Err(err) => return errors::store_error_to_response(err),
    };

    let users: Vec<UserDto> = users.iter().map(UserDto::from).collect();
    Json(serde_json::json!({ "users": users, "total": total })).into_response()
}

/// GET /api/users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> axum::response::Response {
    let user = match services.users.find_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(err) => return errors::store_error_to_response(err),
    };

    let principal = PrincipalId::new(username);
    let roles = match services.enforcer.direct_roles(&principal).await {
        Ok(roles) => roles,
        Err(err) => return errors::enforce_error_to_response(err),
    };

    Json(serde_json::json!({
        "user": UserDto::from(&user),
        "roles": roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    }))
    .into_response()
}

/// POST /api/users/:id/roles
pub async fn grant_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
    Json(req): Json<GrantRoleRequest>,
) -> axum::response::Response {
    if req.role.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "role must not be empty");
    }

    let principal = PrincipalId::new(username);
    match services
        .enforcer
        .grant_role(&principal, &Role::new(req.role))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::enforce_error_to_response(err),
    }
}

/// DELETE /api/users/:id/roles/:role
pub async fn revoke_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path((username, role)): Path<(String, String)>,
) -> axum::response::Response {
    let principal = PrincipalId::new(username);
    match services
        .enforcer
        .revoke_role(&principal, &Role::new(role))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::enforce_error_to_response(err),
    }
}
