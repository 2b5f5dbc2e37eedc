//! Policy-tuple administration.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use warden_core::{PolicyTuple, Role};

use crate::app::dto::{PolicyRequest, RoleQuery};
use crate::app::errors::{self, json_error};
use crate::app::services::AppServices;

fn tuple_from_request(req: PolicyRequest) -> Result<PolicyTuple, axum::response::Response> {
    if req.role.is_empty() || req.resource.is_empty() || req.action.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "role, resource and action must not be empty",
        ));
    }
    Ok(PolicyTuple::new(req.role, req.resource, req.action))
}

/// GET /api/policies?role=name
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<RoleQuery>,
) -> axum::response::Response {
    let tuples = match services
        .enforcer
        .policies_for_role(&Role::new(query.role))
        .await
    {
        Ok(tuples) => tuples,
        Err(err) => return errors::enforce_error_to_response(err),
    };

    let policies: Vec<_> = tuples
        .iter()
        .map(|t| {
            serde_json::json!({
                "role": t.role.as_str(),
                "resource": t.resource.as_str(),
                "action": t.action.as_str(),
            })
        })
        .collect();
    Json(serde_json::json!({ "policies": policies })).into_response()
}

/// POST /api/policies
pub async fn put(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<PolicyRequest>,
) -> axum::response::Response {
    let tuple = match tuple_from_request(req) {
        Ok(tuple) => tuple,
        Err(response) => return response,
    };

    match services.enforcer.put_policy(&tuple).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::enforce_error_to_response(err),
    }
}

/// DELETE /api/policies
pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<PolicyRequest>,
) -> axum::response::Response {
    let tuple = match tuple_from_request(req) {
        Ok(tuple) => tuple,
        Err(response) => return response,
    };

    match services.enforcer.remove_policy(&tuple).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::enforce_error_to_response(err),
    }
}
