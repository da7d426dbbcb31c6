use serde::Serialize;

use super::role::Role;

/// Identity of a logged-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: u64,
    pub username: String,
    /// Present only if this login is linked to an employee record
    pub employee_id: Option<String>,
}

/// Who is performing an operation. Passed explicitly into every lifecycle
/// call instead of being read from request state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "profile", rename_all = "lowercase")]
pub enum Actor {
    Admin,
    Member(Profile),
}

impl Actor {
    pub fn from_role(role: Role, profile: Profile) -> Self {
        match role {
            Role::Admin => Actor::Admin,
            Role::Member => Actor::Member(profile),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    /// Employee identity used for attendance lookups, if any.
    pub fn employee_id(&self) -> Option<&str> {
        match self {
            Actor::Admin => None,
            Actor::Member(profile) => profile.employee_id.as_deref(),
        }
    }
}
