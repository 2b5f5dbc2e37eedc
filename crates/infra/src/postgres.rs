//! Postgres-backed store implementations.
//!
//! The database is the system of record: every mutation commits before the
//! call returns and every read goes to the pool, so concurrent request tasks
//! always observe fully-committed state. Cross-row invariants (acyclicity of
//! the inheritance graph) are enforced above this layer.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use warden_core::{PolicyTuple, PrincipalId, Role};

use crate::stores::{PolicyStore, RoleStore, StoreError, UserRecord, UserStore};

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        // 23505 = unique_violation
        if db.code().as_deref() == Some("23505") {
            return StoreError::Duplicate;
        }
    }
    StoreError::unavailable(err.to_string())
}

pub struct PostgresRoleStore {
    pool: PgPool,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PostgresRoleStore {
    async fn grant(&self, principal: &PrincipalId, role: &Role) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO principal_roles (principal_id, role)
            VALUES ($1, $2)
            ON CONFLICT (principal_id, role) DO NOTHING
            "#,
        )
        .bind(principal.as_str())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn revoke(&self, principal: &PrincipalId, role: &Role) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM principal_roles WHERE principal_id = $1 AND role = $2")
            .bind(principal.as_str())
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn direct_roles(&self, principal: &PrincipalId) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query("SELECT role FROM principal_roles WHERE principal_id = $1")
            .bind(principal.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("role")
                    .map(Role::from)
                    .map_err(map_sqlx)
            })
            .collect()
    }

    async fn principals_with_role(&self, role: &Role) -> Result<Vec<PrincipalId>, StoreError> {
        let rows = sqlx::query("SELECT principal_id FROM principal_roles WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("principal_id")
                    .map(PrincipalId::from)
                    .map_err(map_sqlx)
            })
            .collect()
    }

    async fn add_inheritance(&self, child: &Role, parent: &Role) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO role_inherits (role, inherited_role)
            VALUES ($1, $2)
            ON CONFLICT (role, inherited_role) DO NOTHING
            "#,
        )
        .bind(child.as_str())
        .bind(parent.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn remove_inheritance(&self, child: &Role, parent: &Role) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM role_inherits WHERE role = $1 AND inherited_role = $2")
            .bind(child.as_str())
            .bind(parent.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn inheritance_edges(&self) -> Result<Vec<(Role, Role)>, StoreError> {
        let rows = sqlx::query("SELECT role, inherited_role FROM role_inherits")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                let child = row.try_get::<String, _>("role").map_err(map_sqlx)?;
                let parent = row.try_get::<String, _>("inherited_role").map_err(map_sqlx)?;
                Ok((Role::from(child), Role::from(parent)))
            })
            .collect()
    }
}

pub struct PostgresPolicyStore {
    pool: PgPool,
}

impl PostgresPolicyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyStore for PostgresPolicyStore {
    async fn put(&self, tuple: &PolicyTuple) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO policy_rules (role, resource, action)
            VALUES ($1, $2, $3)
            ON CONFLICT (role, resource, action) DO NOTHING
            "#,
        )
        .bind(tuple.role.as_str())
        .bind(tuple.resource.as_str())
        .bind(tuple.action.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn remove(&self, tuple: &PolicyTuple) -> Result<(), StoreError> {
        sqlx::query(
            "DELETE FROM policy_rules WHERE role = $1 AND resource = $2 AND action = $3",
        )
        .bind(tuple.role.as_str())
        .bind(tuple.resource.as_str())
        .bind(tuple.action.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_for_role(&self, role: &Role) -> Result<Vec<PolicyTuple>, StoreError> {
        let rows = sqlx::query("SELECT role, resource, action FROM policy_rules WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                let role = row.try_get::<String, _>("role").map_err(map_sqlx)?;
                let resource = row.try_get::<String, _>("resource").map_err(map_sqlx)?;
                let action = row.try_get::<String, _>("action").map_err(map_sqlx)?;
                Ok(PolicyTuple::new(role, resource, action))
            })
            .collect()
    }
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<UserRecord, StoreError> {
    Ok(UserRecord {
        username: row.try_get("username").map_err(map_sqlx)?,
        email: row.try_get("email").map_err(map_sqlx)?,
        display_name: row.try_get("display_name").map_err(map_sqlx)?,
        password_hash: row.try_get("password_hash").map_err(map_sqlx)?,
        active: row.try_get("active").map_err(map_sqlx)?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, user: &UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, email, display_name, password_hash, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT username, email, display_name, password_hash, active, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<UserRecord>, i64), StoreError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?
            .try_get("total")
            .map_err(map_sqlx)?;

        let rows = sqlx::query(
            r#"
            SELECT username, email, display_name, password_hash, active, created_at
            FROM users
            ORDER BY created_at
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }
}
