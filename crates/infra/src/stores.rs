//! Store traits consumed by the enforcement engine and the API layer.
//!
//! All mutations must durably commit before returning `Ok`; reads reflect the
//! latest committed state within the process. Implementations are the
//! serialization point for concurrent access (connection pool or lock), so
//! readers never observe a partially-applied mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use warden_auth::resource_matches;
use warden_core::{Action, PolicyTuple, PrincipalId, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was violated (e.g. duplicate username).
    #[error("duplicate record")]
    Duplicate,
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Durable role-grant and role-inheritance edges.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Grant `role` directly to `principal`. Idempotent.
    async fn grant(&self, principal: &PrincipalId, role: &Role) -> Result<(), StoreError>;

    /// Revoke a direct grant. Revoking a missing grant is a no-op.
    async fn revoke(&self, principal: &PrincipalId, role: &Role) -> Result<(), StoreError>;

    /// Roles granted directly to `principal` (no inheritance applied).
    async fn direct_roles(&self, principal: &PrincipalId) -> Result<Vec<Role>, StoreError>;

    /// Principals holding a direct grant of `role` (administrative display).
    async fn principals_with_role(&self, role: &Role) -> Result<Vec<PrincipalId>, StoreError>;

    /// Record that `child` inherits every permission of `parent`. Idempotent.
    ///
    /// Acyclicity is checked by the enforcement engine before this is called;
    /// the store itself only guarantees uniqueness of the edge.
    async fn add_inheritance(&self, child: &Role, parent: &Role) -> Result<(), StoreError>;

    /// Remove an inheritance edge. Removing a missing edge is a no-op.
    async fn remove_inheritance(&self, child: &Role, parent: &Role) -> Result<(), StoreError>;

    /// The complete inheritance edge set as `(child, parent)` pairs.
    async fn inheritance_edges(&self) -> Result<Vec<(Role, Role)>, StoreError>;
}

/// Durable set of `(role, resource, action)` policy tuples.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Insert a tuple. Duplicate inserts are no-ops.
    async fn put(&self, tuple: &PolicyTuple) -> Result<(), StoreError>;

    /// Delete a tuple. Deleting a missing tuple is a no-op.
    async fn remove(&self, tuple: &PolicyTuple) -> Result<(), StoreError>;

    /// Tuples granted to `role`, enumeration order unspecified.
    async fn list_for_role(&self, role: &Role) -> Result<Vec<PolicyTuple>, StoreError>;

    /// Does any tuple of `role` cover `(path, action)`?
    ///
    /// Resources use segment-placeholder matching (see
    /// [`warden_auth::matcher`]); actions compare literally.
    async fn matches(&self, role: &Role, path: &str, action: &Action) -> Result<bool, StoreError> {
        let tuples = self.list_for_role(role).await?;
        Ok(tuples
            .iter()
            .any(|t| t.action == *action && resource_matches(t.resource.as_str(), path)))
    }
}

/// A provisioned user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Durable identity store (the external collaborator owning principals).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Fails with [`StoreError::Duplicate`] when the username
    /// or email is already taken.
    async fn create(&self, user: &UserRecord) -> Result<(), StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Page of users plus the total count.
    async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<UserRecord>, i64), StoreError>;
}
