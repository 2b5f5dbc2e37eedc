//! HTTP application wiring (axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: injectable service bundle (codec, enforcer, stores)
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses
//!
//! The route tree mirrors the gate's three trust levels: public, token
//! required, token + policy check required.

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{delete, get, post},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        verifier: services.codec.clone(),
    };
    let gate_state = middleware::GateState {
        enforcer: services.enforcer.clone(),
    };

    let public = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/health", get(routes::system::health));

    // Token required, no policy check.
    let authenticated = Router::new()
        .route("/api/users/profile", get(routes::auth::profile))
        .route("/api/dashboard", get(routes::system::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            middleware::authenticate,
        ));

    // Token required, then (path, method) checked against the policy set.
    let enforced = Router::new()
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users/:id", get(routes::users::get_user))
        .route("/api/users/:id/roles", post(routes::users::grant_role))
        .route(
            "/api/users/:id/roles/:role",
            delete(routes::users::revoke_role),
        )
        .route("/api/roles", get(routes::roles::list_inheritance))
        .route("/api/roles/:name", get(routes::roles::get_role))
        .route(
            "/api/roles/:name/inherits",
            post(routes::roles::add_inheritance),
        )
        .route(
            "/api/roles/:name/inherits/:parent",
            delete(routes::roles::remove_inheritance),
        )
        .route(
            "/api/policies",
            get(routes::policies::list)
                .post(routes::policies::put)
                .delete(routes::policies::remove),
        )
        .layer(axum::middleware::from_fn_with_state(
            gate_state,
            middleware::enforce,
        ))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::authenticate,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(enforced)
        .layer(Extension(services))
        // Outermost: panics become generic 500s, never 2xx.
        .layer(CatchPanicLayer::custom(errors::panic_response))
}
