//! Wiring tests for the enforcement engine against in-memory backends.
//!
//! Covers the decision semantics end to end: deny-by-default, inheritance
//! resolution, placeholder matching through the policy store, idempotent
//! mutations, cycle rejection, and the store-failure contract.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use warden_core::{Action, PolicyTuple, PrincipalId, Role};

    use crate::enforce::{EnforceError, Enforcer};
    use crate::memory::{InMemoryPolicyStore, InMemoryRoleStore};
    use crate::migrations::default_policies;
    use crate::stores::{PolicyStore, RoleStore, StoreError};

    fn principal(name: &str) -> PrincipalId {
        PrincipalId::new(name.to_string())
    }

    fn role(name: &str) -> Role {
        Role::new(name.to_string())
    }

    fn action(name: &str) -> Action {
        Action::new(name.to_string())
    }

    fn setup() -> Enforcer {
        Enforcer::new(
            Arc::new(InMemoryRoleStore::new()),
            Arc::new(InMemoryPolicyStore::new()),
        )
    }

    /// Policy store double that fails every call, simulating an unreachable
    /// backend.
    struct UnreachablePolicyStore;

    #[async_trait]
    impl PolicyStore for UnreachablePolicyStore {
        async fn put(&self, _tuple: &PolicyTuple) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn remove(&self, _tuple: &PolicyTuple) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn list_for_role(&self, _role: &Role) -> Result<Vec<PolicyTuple>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    #[tokio::test]
    async fn deny_by_default_for_unknown_principal() {
        let enforcer = setup();
        let allowed = enforcer
            .is_allowed(&principal("nobody"), "/api/dashboard", &action("GET"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn granted_role_with_matching_tuple_admits() {
        let enforcer = setup();
        enforcer
            .put_policy(&PolicyTuple::new("user", "/api/dashboard", "GET"))
            .await
            .unwrap();
        enforcer.grant_role(&principal("alice"), &role("user")).await.unwrap();

        let allowed = enforcer
            .is_allowed(&principal("alice"), "/api/dashboard", &action("GET"))
            .await
            .unwrap();
        assert!(allowed);

        let denied = enforcer
            .is_allowed(&principal("alice"), "/api/users", &action("DELETE"))
            .await
            .unwrap();
        assert!(!denied);
    }

    #[tokio::test]
    async fn inherited_role_grants_access() {
        let enforcer = setup();
        // Tuple exists only for "user"; bob only holds "admin".
        enforcer
            .put_policy(&PolicyTuple::new("user", "/api/dashboard", "GET"))
            .await
            .unwrap();
        enforcer.add_inheritance(&role("admin"), &role("user")).await.unwrap();
        enforcer.grant_role(&principal("bob"), &role("admin")).await.unwrap();

        let allowed = enforcer
            .is_allowed(&principal("bob"), "/api/dashboard", &action("GET"))
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn placeholder_tuple_matches_parameterized_path() {
        let enforcer = setup();
        enforcer
            .put_policy(&PolicyTuple::new("admin", "/api/users/:id", "DELETE"))
            .await
            .unwrap();
        enforcer.grant_role(&principal("root"), &role("admin")).await.unwrap();

        assert!(enforcer
            .is_allowed(&principal("root"), "/api/users/42", &action("DELETE"))
            .await
            .unwrap());
        assert!(!enforcer
            .is_allowed(&principal("root"), "/api/users/42/roles", &action("DELETE"))
            .await
            .unwrap());
        // Action is literal: a GET tuple does not cover DELETE.
        assert!(!enforcer
            .is_allowed(&principal("root"), "/api/users/42", &action("GET"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn effective_roles_are_order_independent() {
        let a_then_b = setup();
        a_then_b.grant_role(&principal("p"), &role("a")).await.unwrap();
        a_then_b.grant_role(&principal("p"), &role("b")).await.unwrap();

        let b_then_a = setup();
        b_then_a.grant_role(&principal("p"), &role("b")).await.unwrap();
        b_then_a.grant_role(&principal("p"), &role("a")).await.unwrap();

        assert_eq!(
            a_then_b.effective_roles(&principal("p")).await.unwrap(),
            b_then_a.effective_roles(&principal("p")).await.unwrap(),
        );
    }

    #[tokio::test]
    async fn revoke_removes_access() {
        let enforcer = setup();
        enforcer
            .put_policy(&PolicyTuple::new("user", "/api/dashboard", "GET"))
            .await
            .unwrap();
        enforcer.grant_role(&principal("carol"), &role("user")).await.unwrap();
        enforcer.revoke_role(&principal("carol"), &role("user")).await.unwrap();

        assert!(!enforcer
            .is_allowed(&principal("carol"), "/api/dashboard", &action("GET"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn policy_put_and_remove_are_idempotent() {
        let enforcer = setup();
        let tuple = PolicyTuple::new("user", "/api/dashboard", "GET");

        enforcer.put_policy(&tuple).await.unwrap();
        enforcer.put_policy(&tuple).await.unwrap();
        assert_eq!(enforcer.policies_for_role(&role("user")).await.unwrap().len(), 1);

        enforcer.remove_policy(&tuple).await.unwrap();
        // Removing a tuple that is already gone is not an error.
        enforcer.remove_policy(&tuple).await.unwrap();
        assert!(enforcer.policies_for_role(&role("user")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cycle_introducing_edge_is_rejected() {
        let enforcer = setup();
        enforcer.add_inheritance(&role("admin"), &role("user")).await.unwrap();
        enforcer.add_inheritance(&role("user"), &role("guest")).await.unwrap();

        let err = enforcer
            .add_inheritance(&role("guest"), &role("admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnforceError::CycleDetected { .. }));

        // The rejected edge must not have corrupted the graph.
        let edges = enforcer.inheritance_edges().await.unwrap();
        assert_eq!(edges.len(), 2);
    }

    #[tokio::test]
    async fn store_failure_is_distinct_from_deny() {
        let roles = Arc::new(InMemoryRoleStore::new());
        let enforcer = Enforcer::new(roles.clone(), Arc::new(UnreachablePolicyStore));
        roles
            .grant(&principal("alice"), &role("user"))
            .await
            .unwrap();

        let result = enforcer
            .is_allowed(&principal("alice"), "/api/dashboard", &action("GET"))
            .await;
        assert!(matches!(result, Err(EnforceError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn empty_role_set_denies_without_querying_policies() {
        // The policy store fails on every call; an empty snapshot must still
        // produce a clean deny.
        let enforcer = Enforcer::new(
            Arc::new(InMemoryRoleStore::new()),
            Arc::new(UnreachablePolicyStore),
        );

        let allowed = enforcer
            .is_allowed_for_roles(&[], "/api/dashboard", &action("GET"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn token_snapshot_roles_resolve_inheritance() {
        let enforcer = setup();
        enforcer
            .put_policy(&PolicyTuple::new("user", "/api/dashboard", "GET"))
            .await
            .unwrap();
        enforcer.add_inheritance(&role("admin"), &role("user")).await.unwrap();

        // No direct grant in the store; the snapshot alone drives the decision.
        let allowed = enforcer
            .is_allowed_for_roles(&[role("admin")], "/api/dashboard", &action("GET"))
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn default_policy_seed_covers_the_admin_surface() {
        let enforcer = setup();
        for tuple in default_policies() {
            enforcer.put_policy(&tuple).await.unwrap();
        }
        enforcer.grant_role(&principal("root"), &role("admin")).await.unwrap();
        enforcer.grant_role(&principal("alice"), &role("user")).await.unwrap();

        assert!(enforcer
            .is_allowed(&principal("root"), "/api/users/42", &action("GET"))
            .await
            .unwrap());
        assert!(enforcer
            .is_allowed(&principal("root"), "/api/users/42/roles/user", &action("DELETE"))
            .await
            .unwrap());
        assert!(enforcer
            .is_allowed(&principal("alice"), "/api/dashboard", &action("GET"))
            .await
            .unwrap());
        assert!(!enforcer
            .is_allowed(&principal("alice"), "/api/users", &action("GET"))
            .await
            .unwrap());
    }
}
