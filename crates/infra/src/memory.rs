//! In-memory store backends.
//!
//! Used by tests and local development. A coarse `RwLock` per store
//! serializes mutations against readers, matching the consistency contract
//! of the Postgres backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;

use warden_core::{PolicyTuple, PrincipalId, Role};

use crate::stores::{PolicyStore, RoleStore, StoreError, UserRecord, UserStore};

#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    grants: RwLock<BTreeSet<(PrincipalId, Role)>>,
    edges: RwLock<BTreeSet<(Role, Role)>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn grant(&self, principal: &PrincipalId, role: &Role) -> Result<(), StoreError> {
        let mut grants = self.grants.write().expect("role store lock poisoned");
        grants.insert((principal.clone(), role.clone()));
        Ok(())
    }

    async fn revoke(&self, principal: &PrincipalId, role: &Role) -> Result<(), StoreError> {
        let mut grants = self.grants.write().expect("role store lock poisoned");
        grants.remove(&(principal.clone(), role.clone()));
        Ok(())
    }

    async fn direct_roles(&self, principal: &PrincipalId) -> Result<Vec<Role>, StoreError> {
        let grants = self.grants.read().expect("role store lock poisoned");
        Ok(grants
            .iter()
            .filter(|(p, _)| p == principal)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn principals_with_role(&self, role: &Role) -> Result<Vec<PrincipalId>, StoreError> {
        let grants = self.grants.read().expect("role store lock poisoned");
        Ok(grants
            .iter()
            .filter(|(_, r)| r == role)
            .map(|(p, _)| p.clone())
            .collect())
    }

    async fn add_inheritance(&self, child: &Role, parent: &Role) -> Result<(), StoreError> {
        let mut edges = self.edges.write().expect("role store lock poisoned");
        edges.insert((child.clone(), parent.clone()));
        Ok(())
    }

    async fn remove_inheritance(&self, child: &Role, parent: &Role) -> Result<(), StoreError> {
        let mut edges = self.edges.write().expect("role store lock poisoned");
        edges.remove(&(child.clone(), parent.clone()));
        Ok(())
    }

    async fn inheritance_edges(&self) -> Result<Vec<(Role, Role)>, StoreError> {
        let edges = self.edges.read().expect("role store lock poisoned");
        Ok(edges.iter().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    tuples: RwLock<BTreeSet<PolicyTuple>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn put(&self, tuple: &PolicyTuple) -> Result<(), StoreError> {
        let mut tuples = self.tuples.write().expect("policy store lock poisoned");
        tuples.insert(tuple.clone());
        Ok(())
    }

    async fn remove(&self, tuple: &PolicyTuple) -> Result<(), StoreError> {
        let mut tuples = self.tuples.write().expect("policy store lock poisoned");
        tuples.remove(tuple);
        Ok(())
    }

    async fn list_for_role(&self, role: &Role) -> Result<Vec<PolicyTuple>, StoreError> {
        let tuples = self.tuples.read().expect("policy store lock poisoned");
        Ok(tuples.iter().filter(|t| t.role == *role).cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().expect("user store lock poisoned");
        let taken = users.contains_key(&user.username)
            || users.values().any(|u| u.email == user.email);
        if taken {
            return Err(StoreError::Duplicate);
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users.get(username).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<UserRecord>, i64), StoreError> {
        let users = self.users.read().expect("user store lock poisoned");
        let total = users.len() as i64;
        let page = users
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
