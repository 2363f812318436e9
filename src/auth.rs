//! Request-scoped permission context handed to every template operation.
use std::collections::HashSet;

use crate::error::AppError;
use crate::template::{TemplateOwner, ZoneTemplate};

/// Permissions the template subsystem checks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Create master zones, and with them zone templates.
    ZoneMasterAdd,
    /// Bypass every ownership check.
    Ueberuser,
}

impl Permission {
    /// Parse the permission names used in the console's permission templates.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "zone_master_add" => Some(Permission::ZoneMasterAdd),
            "user_is_ueberuser" => Some(Permission::Ueberuser),
            _ => None,
        }
    }
}

/// Identity and already-evaluated grants of the caller.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub user_id: i64,
    grants: HashSet<Permission>,
}

impl PermissionContext {
    pub fn new(user_id: i64, grants: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            user_id,
            grants: grants.into_iter().collect(),
        }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.grants.contains(&Permission::Ueberuser) || self.grants.contains(&permission)
    }

    pub fn is_ueberuser(&self) -> bool {
        self.grants.contains(&Permission::Ueberuser)
    }

    /// Owner filter for listings: `None` means every template is visible.
    pub fn visible_owner(&self) -> Option<i64> {
        if self.is_ueberuser() {
            None
        } else {
            Some(self.user_id)
        }
    }

    pub fn require(&self, permission: Permission, action: &str) -> Result<(), AppError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "you do not have the permission to {action}"
            )))
        }
    }

    pub fn can_view(&self, template: &ZoneTemplate) -> bool {
        self.is_ueberuser()
            || match template.owner {
                TemplateOwner::Global => true,
                TemplateOwner::User(id) => id == self.user_id,
            }
    }

    /// Global templates belong to ueberusers; user templates to their owner.
    pub fn can_modify(&self, template: &ZoneTemplate) -> bool {
        self.is_ueberuser()
            || (self.has(Permission::ZoneMasterAdd)
                && template.owner == TemplateOwner::User(self.user_id))
    }
}
