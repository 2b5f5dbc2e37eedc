//! Schema migration and default-policy seeding.

use sqlx::PgPool;

use warden_core::PolicyTuple;

use crate::stores::{PolicyStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        username      TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        display_name  TEXT NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL,
        active        BOOLEAN NOT NULL DEFAULT TRUE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS principal_roles (
        principal_id TEXT NOT NULL,
        role         TEXT NOT NULL,
        PRIMARY KEY (principal_id, role)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role_inherits (
        role           TEXT NOT NULL,
        inherited_role TEXT NOT NULL,
        PRIMARY KEY (role, inherited_role)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS policy_rules (
        role     TEXT NOT NULL,
        resource TEXT NOT NULL,
        action   TEXT NOT NULL,
        PRIMARY KEY (role, resource, action)
    )
    "#,
];

/// Create the schema if it does not exist yet.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema up to date");
    Ok(())
}

/// The out-of-the-box policy set for a fresh deployment.
///
/// Admin manages users, roles and policies; a plain user sees their own
/// profile and the dashboard; guests only reach the public area.
pub fn default_policies() -> Vec<PolicyTuple> {
    let admin: &[(&str, &[&str])] = &[
        ("/api/users", &["GET"]),
        ("/api/users/:id", &["GET"]),
        ("/api/users/:id/roles", &["POST"]),
        ("/api/users/:id/roles/:role", &["DELETE"]),
        ("/api/roles", &["GET"]),
        ("/api/roles/:name", &["GET"]),
        ("/api/roles/:name/inherits", &["POST"]),
        ("/api/roles/:name/inherits/:parent", &["DELETE"]),
        ("/api/policies", &["GET", "POST", "DELETE"]),
        ("/api/dashboard", &["GET"]),
    ];
    let user: &[(&str, &[&str])] = &[
        ("/api/users/profile", &["GET"]),
        ("/api/dashboard", &["GET"]),
    ];
    let guest: &[(&str, &[&str])] = &[("/api/public", &["GET"])];

    let mut tuples = Vec::new();
    for (role, grants) in [("admin", admin), ("user", user), ("guest", guest)] {
        for (resource, actions) in grants {
            for action in *actions {
                tuples.push(PolicyTuple::new(
                    role.to_string(),
                    resource.to_string(),
                    action.to_string(),
                ));
            }
        }
    }
    tuples
}

/// Insert the default policy set. Idempotent: `put` is a no-op for tuples
/// that already exist, so re-running at every boot is safe.
pub async fn seed_default_policies(policies: &dyn PolicyStore) -> Result<(), StoreError> {
    let defaults = default_policies();
    let count = defaults.len();
    for tuple in &defaults {
        policies.put(tuple).await?;
    }
    tracing::info!(count, "default policies seeded");
    Ok(())
}
