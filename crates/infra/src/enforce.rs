//! Enforcement engine.
//!
//! Composes a role store and a policy store to answer
//! `is_allowed(subject, resource, action)`. Deny by default: the request is
//! admitted only when at least one effective role carries a matching tuple
//! (logical OR across roles). Store failures surface as
//! [`EnforceError::StoreUnavailable`] and are never folded into an allow or
//! deny decision.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use warden_auth::{introduces_cycle, role_closure};
use warden_core::{Action, PolicyTuple, PrincipalId, Role};

use crate::stores::{PolicyStore, RoleStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnforceError {
    /// The role or policy backing store was unreachable mid-decision.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The requested inheritance edge would make the role graph cyclic.
    #[error("role inheritance cycle: '{child}' would inherit '{parent}'")]
    CycleDetected { child: Role, parent: Role },
}

impl From<StoreError> for EnforceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => EnforceError::StoreUnavailable(msg),
            // Role/policy writes are idempotent upserts; a uniqueness clash
            // still means the store rejected the write.
            StoreError::Duplicate => EnforceError::StoreUnavailable("duplicate record".into()),
        }
    }
}

/// The decision point every protected request passes through.
///
/// Explicitly owned and injected into the request gate at construction; never
/// a process-wide singleton, so tests can run against fixture stores.
pub struct Enforcer {
    roles: Arc<dyn RoleStore>,
    policies: Arc<dyn PolicyStore>,
}

impl Enforcer {
    pub fn new(roles: Arc<dyn RoleStore>, policies: Arc<dyn PolicyStore>) -> Self {
        Self { roles, policies }
    }

    /// Transitive closure of `principal`'s direct grants over the
    /// inheritance graph.
    pub async fn effective_roles(
        &self,
        principal: &PrincipalId,
    ) -> Result<HashSet<Role>, EnforceError> {
        let direct = self.roles.direct_roles(principal).await?;
        if direct.is_empty() {
            return Ok(HashSet::new());
        }
        let edges = self.roles.inheritance_edges().await?;
        Ok(role_closure(&direct, &edges))
    }

    /// Decide `(principal, resource, action)` by live-resolving the
    /// principal's roles from the store.
    pub async fn is_allowed(
        &self,
        principal: &PrincipalId,
        resource: &str,
        action: &Action,
    ) -> Result<bool, EnforceError> {
        let direct = self.roles.direct_roles(principal).await?;
        self.is_allowed_for_roles(&direct, resource, action).await
    }

    /// Decide `(roles, resource, action)` for an already-known direct role
    /// set, e.g. the snapshot carried in a verified token.
    pub async fn is_allowed_for_roles(
        &self,
        direct: &[Role],
        resource: &str,
        action: &Action,
    ) -> Result<bool, EnforceError> {
        if direct.is_empty() {
            // Empty role set: deny without touching the policy store.
            return Ok(false);
        }

        let edges = self.roles.inheritance_edges().await?;
        let effective = role_closure(direct, &edges);

        for role in &effective {
            if self.policies.matches(role, resource, action).await? {
                tracing::debug!(role = role.as_str(), resource, action = action.as_str(), "policy match");
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn grant_role(
        &self,
        principal: &PrincipalId,
        role: &Role,
    ) -> Result<(), EnforceError> {
        self.roles.grant(principal, role).await?;
        tracing::info!(principal = principal.as_str(), role = role.as_str(), "role granted");
        Ok(())
    }

    pub async fn revoke_role(
        &self,
        principal: &PrincipalId,
        role: &Role,
    ) -> Result<(), EnforceError> {
        self.roles.revoke(principal, role).await?;
        tracing::info!(principal = principal.as_str(), role = role.as_str(), "role revoked");
        Ok(())
    }

    pub async fn direct_roles(&self, principal: &PrincipalId) -> Result<Vec<Role>, EnforceError> {
        Ok(self.roles.direct_roles(principal).await?)
    }

    pub async fn principals_with_role(
        &self,
        role: &Role,
    ) -> Result<Vec<PrincipalId>, EnforceError> {
        Ok(self.roles.principals_with_role(role).await?)
    }

    /// Add `child inherits parent`, rejecting cycle-introducing edges.
    ///
    /// The check-then-insert is not atomic across writers; the closure
    /// traversal keeps a visited set, so even a racing cycle cannot make
    /// resolution non-terminating.
    pub async fn add_inheritance(&self, child: &Role, parent: &Role) -> Result<(), EnforceError> {
        let edges = self.roles.inheritance_edges().await?;
        if introduces_cycle(&edges, child, parent) {
            return Err(EnforceError::CycleDetected {
                child: child.clone(),
                parent: parent.clone(),
            });
        }
        self.roles.add_inheritance(child, parent).await?;
        tracing::info!(child = child.as_str(), parent = parent.as_str(), "inheritance added");
        Ok(())
    }

    pub async fn remove_inheritance(
        &self,
        child: &Role,
        parent: &Role,
    ) -> Result<(), EnforceError> {
        Ok(self.roles.remove_inheritance(child, parent).await?)
    }

    pub async fn inheritance_edges(&self) -> Result<Vec<(Role, Role)>, EnforceError> {
        Ok(self.roles.inheritance_edges().await?)
    }

    pub async fn put_policy(&self, tuple: &PolicyTuple) -> Result<(), EnforceError> {
        self.policies.put(tuple).await?;
        tracing::info!(%tuple, "policy added");
        Ok(())
    }

    pub async fn remove_policy(&self, tuple: &PolicyTuple) -> Result<(), EnforceError> {
        self.policies.remove(tuple).await?;
        tracing::info!(%tuple, "policy removed");
        Ok(())
    }

    pub async fn policies_for_role(&self, role: &Role) -> Result<Vec<PolicyTuple>, EnforceError> {
        Ok(self.policies.list_for_role(role).await?)
    }
}
