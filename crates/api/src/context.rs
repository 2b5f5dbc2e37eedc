use warden_core::{PrincipalId, Role};

/// Principal context for a request (authenticated identity + role snapshot).
///
/// Attached as a request extension by the authentication middleware after
/// token verification; handlers and the enforcement middleware read it from
/// there. The roles are the snapshot carried in the token, not a live view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
