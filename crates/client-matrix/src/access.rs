use serde::{Deserialize, Serialize};

/// Tenant identifier; every matrix and client belongs to exactly one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Organization role of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Member,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "member" | "user" | "employee" => Some(Role::Member),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }

    /// Create and edit matrices, their criteria and quadrant rules.
    pub const fn can_manage_matrices(self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Manager)
    }

    /// Soft delete, permanently delete and inspect deletion impact.
    pub const fn can_delete_matrices(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

/// Authenticated caller as established by the outer authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn owns(&self, organization_id: OrganizationId) -> bool {
        self.organization_id == organization_id
    }
}
