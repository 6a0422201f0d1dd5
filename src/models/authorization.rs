//! Models for working with authorization (acl - access control list)
use std::fmt;

use models::UserId;

/// Resources guarded by ACL
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resource {
    Coupons,
    UsedCoupons,
    Rewards,
    RewardRedemptions,
    UserPoints,
    Products,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Resource::Coupons => write!(f, "coupons"),
            Resource::UsedCoupons => write!(f, "used coupons"),
            Resource::Rewards => write!(f, "rewards"),
            Resource::RewardRedemptions => write!(f, "reward redemptions"),
            Resource::UserPoints => write!(f, "user points"),
            Resource::Products => write!(f, "products"),
        }
    }
}

// All gives all permissions.
// Read - read resource with id,
// Create, Update, Delete - write resource with id.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    All,
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::All => write!(f, "all"),
            Action::Read => write!(f, "read"),
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Scope of a permission. Owned resources belong to the user doing the request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    All,
    Owned,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Role {
    Superuser,
    User,
}

pub struct Permission {
    pub resource: Resource,
    pub action: Action,
    pub scope: Scope,
}

/// What the host session store knows about the authenticated customer
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl UserSession {
    pub fn new(user_id: UserId, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }

    pub fn roles(&self) -> Vec<Role> {
        if self.is_admin {
            vec![Role::Superuser, Role::User]
        } else {
            vec![Role::User]
        }
    }
}
