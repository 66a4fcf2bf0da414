//! Caller session contract and the default in-memory session.

use crate::auth::privilege::Privilege;
use std::collections::BTreeSet;

/// Read-only view of the caller's session.
///
/// Passed explicitly to every service call; the service never stores it.
pub trait AuthContext {
    fn is_authenticated(&self) -> bool;
    fn has_privilege(&self, privilege: Privilege) -> bool;
}

impl<T: AuthContext + ?Sized> AuthContext for &T {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn has_privilege(&self, privilege: Privilege) -> bool {
        (**self).has_privilege(privilege)
    }
}

/// Session snapshot built by whatever authenticated the caller.
///
/// An anonymous session holds no privileges, even if some were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    username: Option<String>,
    privileges: BTreeSet<Privilege>,
    superuser: bool,
}

impl SessionContext {
    /// Unauthenticated session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated session with an explicit privilege grant.
    pub fn authenticated(
        username: impl Into<String>,
        privileges: impl IntoIterator<Item = Privilege>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            privileges: privileges.into_iter().collect(),
            superuser: false,
        }
    }

    /// Authenticated session that holds every privilege.
    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            privileges: BTreeSet::new(),
            superuser: true,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn privileges(&self) -> &BTreeSet<Privilege> {
        &self.privileges
    }

    pub fn grant(&mut self, privilege: Privilege) {
        self.privileges.insert(privilege);
    }

    pub fn revoke(&mut self, privilege: Privilege) {
        self.privileges.remove(&privilege);
    }
}

impl AuthContext for SessionContext {
    fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    fn has_privilege(&self, privilege: Privilege) -> bool {
        self.is_authenticated() && (self.superuser || self.privileges.contains(&privilege))
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthContext, SessionContext};
    use crate::auth::privilege::Privilege;

    #[test]
    fn anonymous_session_has_nothing() {
        let mut session = SessionContext::anonymous();
        session.grant(Privilege::ViewPatients);
        assert!(!session.is_authenticated());
        assert!(!session.has_privilege(Privilege::ViewPatients));
    }

    #[test]
    fn authenticated_session_holds_only_granted_privileges() {
        let mut session = SessionContext::authenticated("clerk", [Privilege::ViewPatients]);
        assert!(session.is_authenticated());
        assert_eq!(session.username(), Some("clerk"));
        assert!(session.has_privilege(Privilege::ViewPatients));
        assert!(!session.has_privilege(Privilege::EditPatients));

        session.grant(Privilege::EditPatients);
        assert!(session.has_privilege(Privilege::EditPatients));
        session.revoke(Privilege::ViewPatients);
        assert!(!session.has_privilege(Privilege::ViewPatients));
    }

    #[test]
    fn superuser_holds_every_privilege() {
        let session = SessionContext::superuser("admin");
        for privilege in Privilege::ALL {
            assert!(session.has_privilege(privilege));
        }
        assert!(session.privileges().is_empty());
    }

    fn can_add(ctx: impl AuthContext) -> bool {
        ctx.has_privilege(Privilege::AddPatients)
    }

    #[test]
    fn references_forward_to_inner_context() {
        let session = SessionContext::authenticated("clerk", [Privilege::AddPatients]);
        let by_ref: &dyn AuthContext = &session;
        assert!(can_add(&session));
        assert!(can_add(by_ref));
    }
}
