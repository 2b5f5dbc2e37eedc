//! Role-graph administration: inheritance edges and role inspection.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use warden_core::Role;

use crate::app::dto::InheritRequest;
use crate::app::errors::{self, json_error};
use crate::app::services::AppServices;

/// GET /api/roles — the full inheritance edge set.
pub async fn list_inheritance(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let edges = match services.enforcer.inheritance_edges().await {
        Ok(edges) => edges,
        Err(err) => return errors::enforce_error_to_response(err),
    };

    let edges: Vec<_> = edges
        .iter()
        .map(|(child, parent)| {
            serde_json::json!({ "role": child.as_str(), "inherits": parent.as_str() })
        })
        .collect();
    Json(serde_json::json!({ "inheritance": edges })).into_response()
}

/// GET /api/roles/:name — members, direct policies, and inherited roles.
pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let role = Role::new(name);

    let members = match services.enforcer.principals_with_role(&role).await {
        Ok(members) => members,
        Err(err) => return errors::enforce_error_to_response(err),
    };
    let policies = match services.enforcer.policies_for_role(&role).await {
        Ok(policies) => policies,
        Err(err) => return errors::enforce_error_to_response(err),
    };
    let edges = match services.enforcer.inheritance_edges().await {
        Ok(edges) => edges,
        Err(err) => return errors::enforce_error_to_response(err),
    };

    let inherits: Vec<_> = edges
        .iter()
        .filter(|(child, _)| *child == role)
        .map(|(_, parent)| parent.as_str().to_string())
        .collect();

    Json(serde_json::json!({
        "role": role.as_str(),
        "members": members.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "policies": policies
            .iter()
            .map(|t| serde_json::json!({
                "resource": t.resource.as_str(),
                "action": t.action.as_str(),
            }))
            .collect::<Vec<_>>(),
        "inherits": inherits,
    }))
    .into_response()
}

/// POST /api/roles/:name/inherits
pub async fn add_inheritance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Json(req): Json<InheritRequest>,
) -> axum::response::Response {
    if req.parent.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "parent must not be empty");
    }

    match services
        .enforcer
        .add_inheritance(&Role::new(name), &Role::new(req.parent))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::enforce_error_to_response(err),
    }
}

/// DELETE /api/roles/:name/inherits/:parent
pub async fn remove_inheritance(
    Extension(services): Extension<Arc<AppServices>>,
    Path((name, parent)): Path<(String, String)>,
) -> axum::response::Response {
    match services
        .enforcer
        .remove_inheritance(&Role::new(name), &Role::new(parent))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::enforce_error_to_response(err),
    }
}
