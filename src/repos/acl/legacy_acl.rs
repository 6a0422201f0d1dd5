//! Generic acl traits: a permission table checks an action on a resource,
//! a scope checker decides whether an object belongs to the user.

use models::UserId;

pub trait Acl<Resource, Action, Scope, Error, T> {
    /// Tells if the user with the acl is allowed to do `action` on `resource`.
    /// `obj` is the concrete object, used by the scope checker for owned permissions.
    fn allows(&self, resource: Resource, action: Action, scope_checker: &CheckScope<Scope, T>, obj: Option<&T>) -> Result<bool, Error>;
}

/// Implemented by repos, tells if the object is in scope of the user
pub trait CheckScope<Scope, T> {
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&T>) -> bool;
}

/// Acl of internal flows that act on behalf of the engine itself
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemACL;

impl<Resource, Action, Scope, Error, T> Acl<Resource, Action, Scope, Error, T> for SystemACL {
    fn allows(
        &self,
        _resource: Resource,
        _action: Action,
        _scope_checker: &CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, Error> {
        Ok(true)
    }
}
