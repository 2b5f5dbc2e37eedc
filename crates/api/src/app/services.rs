//! Service wiring: the injectable bundle handed to routes and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use warden_auth::Hs256TokenCodec;
use warden_infra::{
    Enforcer, InMemoryPolicyStore, InMemoryRoleStore, InMemoryUserStore, PolicyStore,
    PostgresPolicyStore, PostgresRoleStore, PostgresUserStore, RoleStore, UserStore,
};

use crate::config::AppConfig;

/// Everything the HTTP layer needs, constructed once at startup and shared
/// across request tasks. No process-wide singletons: tests build their own
/// instance against fixture stores.
pub struct AppServices {
    pub codec: Arc<Hs256TokenCodec>,
    pub enforcer: Arc<Enforcer>,
    pub roles: Arc<dyn RoleStore>,
    pub policies: Arc<dyn PolicyStore>,
    pub users: Arc<dyn UserStore>,
    pub token_ttl: chrono::Duration,
    pub issuer: String,
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        roles: Arc<dyn RoleStore>,
        policies: Arc<dyn PolicyStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            codec: Arc::new(Hs256TokenCodec::new(config.jwt_secret.as_bytes().to_vec())),
            enforcer: Arc::new(Enforcer::new(roles.clone(), policies.clone())),
            roles,
            policies,
            users,
            token_ttl: config.token_ttl,
            issuer: config.issuer.clone(),
        }
    }

    /// Postgres-backed wiring (the production configuration).
    pub fn postgres(config: &AppConfig, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PostgresRoleStore::new(pool.clone())),
            Arc::new(PostgresPolicyStore::new(pool.clone())),
            Arc::new(PostgresUserStore::new(pool)),
        )
    }

    /// In-memory wiring for development and tests. Nothing survives a
    /// restart.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryRoleStore::new()),
            Arc::new(InMemoryPolicyStore::new()),
            Arc::new(InMemoryUserStore::new()),
        )
    }
}
