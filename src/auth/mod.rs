use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, AuthResult};

/// Admin role. Stored as `super_admin` / `admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub enum AdminRole {
    SuperAdmin,
    Admin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::Admin => "admin",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(' ', "_").as_str() {
            "super_admin" | "superadmin" => Some(AdminRole::SuperAdmin),
            "admin" => Some(AdminRole::Admin),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> AuthResult<Self> {
        Self::from_str(value).ok_or_else(|| AuthError::InvalidRole(value.to_string()))
    }

    pub fn can(&self, action: AdminAction) -> bool {
        match self {
            AdminRole::SuperAdmin => true,
            AdminRole::Admin => matches!(action, AdminAction::ManageCatalog),
        }
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    /// Entity, relationship and tag CRUD
    ManageCatalog,
    BulkDelete,
    ManageAdmins,
    ViewAuditLog,
}

impl AdminAction {
    pub fn description(&self) -> &'static str {
        match self {
            AdminAction::ManageCatalog => "manage catalog",
            AdminAction::BulkDelete => "bulk delete",
            AdminAction::ManageAdmins => "manage admins",
            AdminAction::ViewAuditLog => "view audit log",
        }
    }
}

/// The admin on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminActor {
    pub username: String,
    pub role: AdminRole,
    is_system: bool,
}

impl AdminActor {
    pub fn new(username: impl Into<String>, role: AdminRole) -> Self {
        Self {
            username: username.into(),
            role,
            is_system: false,
        }
    }

    /// Actor for command line maintenance tasks; holds every permission.
    pub fn system() -> Self {
        Self {
            username: "system".to_string(),
            role: AdminRole::SuperAdmin,
            is_system: true,
        }
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    /// Role recorded in audit rows.
    pub fn audit_role(&self) -> &'static str {
        if self.is_system {
            "system"
        } else {
            self.role.as_str()
        }
    }

    pub fn require(&self, action: AdminAction) -> AuthResult<()> {
        if self.role.can(action) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(format!(
                "{} requires super admin",
                action.description()
            )))
        }
    }
}
