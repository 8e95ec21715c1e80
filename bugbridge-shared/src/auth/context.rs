/// Identity of the caller behind an authenticated request
///
/// Built by the API's JWT middleware from a freshly loaded user row and passed
/// to the services that restrict operations by role.

use crate::models::user::{User, UserRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller may modify the account `user_id`
    ///
    /// Users manage their own account; admins manage everyone's.
    pub fn can_act_on(&self, user_id: i64) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
