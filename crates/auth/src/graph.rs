//! Role inheritance graph algorithms.
//!
//! An edge `(child, parent)` means holders of `child` also hold every
//! permission of `parent`. The edge set must stay acyclic; cycle-introducing
//! writes are rejected by [`introduces_cycle`] before they are persisted.

use std::collections::{HashMap, HashSet, VecDeque};

use warden_core::Role;

/// Transitive closure of a principal's direct grants over the inheritance
/// edge set.
///
/// Breadth-first with a visited set keyed by role name, so resolution
/// terminates even if a cycle slipped into the edge set out of band.
/// O(roles + edges); uncached, which is fine at the expected scale of tens
/// of roles.
pub fn role_closure(direct: &[Role], edges: &[(Role, Role)]) -> HashSet<Role> {
    let mut parents: HashMap<&Role, Vec<&Role>> = HashMap::new();
    for (child, parent) in edges {
        parents.entry(child).or_default().push(parent);
    }

    let mut effective: HashSet<Role> = HashSet::new();
    let mut queue: VecDeque<&Role> = direct.iter().collect();

    while let Some(role) = queue.pop_front() {
        if !effective.insert(role.clone()) {
            continue;
        }
        if let Some(inherited) = parents.get(role) {
            queue.extend(inherited.iter().copied());
        }
    }

    effective
}

/// Would adding `child inherits parent` introduce a cycle?
///
/// True when `parent` already reaches `child` through existing edges, or when
/// the edge is a self-loop.
pub fn introduces_cycle(edges: &[(Role, Role)], child: &Role, parent: &Role) -> bool {
    if child == parent {
        return true;
    }
    role_closure(std::slice::from_ref(parent), edges).contains(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> Role {
        Role::new(name.to_string())
    }

    fn edge(child: &str, parent: &str) -> (Role, Role) {
        (role(child), role(parent))
    }

    #[test]
    fn empty_grants_yield_empty_closure() {
        let edges = vec![edge("admin", "user")];
        assert!(role_closure(&[], &edges).is_empty());
    }

    #[test]
    fn closure_includes_direct_and_inherited() {
        let edges = vec![edge("admin", "user"), edge("user", "guest")];
        let effective = role_closure(&[role("admin")], &edges);

        assert_eq!(effective.len(), 3);
        assert!(effective.contains(&role("admin")));
        assert!(effective.contains(&role("user")));
        assert!(effective.contains(&role("guest")));
    }

    #[test]
    fn closure_is_order_independent() {
        let edges = vec![edge("admin", "user")];
        let ab = role_closure(&[role("admin"), role("auditor")], &edges);
        let ba = role_closure(&[role("auditor"), role("admin")], &edges);
        assert_eq!(ab, ba);
    }

    #[test]
    fn closure_deduplicates_shared_ancestors() {
        // admin and auditor both inherit user.
        let edges = vec![edge("admin", "user"), edge("auditor", "user")];
        let effective = role_closure(&[role("admin"), role("auditor")], &edges);
        assert_eq!(effective.len(), 3);
    }

    #[test]
    fn closure_terminates_on_cyclic_edges() {
        // Cycles are rejected at write time; traversal still must not hang if
        // one exists.
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let effective = role_closure(&[role("a")], &edges);
        assert_eq!(effective.len(), 3);
    }

    #[test]
    fn self_edge_is_a_cycle() {
        assert!(introduces_cycle(&[], &role("admin"), &role("admin")));
    }

    #[test]
    fn direct_back_edge_is_a_cycle() {
        let edges = vec![edge("admin", "user")];
        assert!(introduces_cycle(&edges, &role("user"), &role("admin")));
    }

    #[test]
    fn transitive_back_edge_is_a_cycle() {
        let edges = vec![edge("admin", "user"), edge("user", "guest")];
        assert!(introduces_cycle(&edges, &role("guest"), &role("admin")));
    }

    #[test]
    fn forward_edge_is_not_a_cycle() {
        let edges = vec![edge("admin", "user")];
        assert!(!introduces_cycle(&edges, &role("user"), &role("guest")));
        // A second path to an existing ancestor is fine too.
        assert!(!introduces_cycle(&edges, &role("auditor"), &role("user")));
    }
}
