//! `warden-infra` — storage boundary and enforcement engine.
//!
//! Store traits are defined here together with two implementations each: a
//! Postgres backend (the system of record) and an in-memory backend used by
//! tests and local development. The enforcement engine composes a role store
//! and a policy store behind `Arc<dyn ...>` seams so the API layer can be
//! wired against either backend.

pub mod enforce;
pub mod memory;
pub mod migrations;
pub mod password;
pub mod postgres;
pub mod stores;

#[cfg(test)]
mod integration_tests;

pub use enforce::{EnforceError, Enforcer};
pub use memory::{InMemoryPolicyStore, InMemoryRoleStore, InMemoryUserStore};
pub use migrations::{default_policies, seed_default_policies};
pub use password::{hash_password, verify_password};
pub use postgres::{PostgresPolicyStore, PostgresRoleStore, PostgresUserStore};
pub use stores::{PolicyStore, RoleStore, StoreError, UserRecord, UserStore};
