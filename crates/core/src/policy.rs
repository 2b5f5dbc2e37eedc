//! Policy tuple value object.

use serde::{Deserialize, Serialize};

use crate::id::{Action, ResourcePattern, Role};

/// A `(role, resource, action)` authorization grant.
///
/// The triple is unique in the policy set; inserting a duplicate or removing
/// a missing tuple is a no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyTuple {
    pub role: Role,
    pub resource: ResourcePattern,
    pub action: Action,
}

impl PolicyTuple {
    pub fn new(
        role: impl Into<Role>,
        resource: impl Into<ResourcePattern>,
        action: impl Into<Action>,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }
}

impl core::fmt::Display for PolicyTuple {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.role, self.resource, self.action)
    }
}
