//! Roles and permission gates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    OfficeAdmin,
    HrManager,
    Employee,
}

/// Actions guarded by a role check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageUsers,
    ManageOrganization,
    ManageDepartments,
    ManageEmployees,
    ViewEmployees,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::OfficeAdmin,
        Role::HrManager,
        Role::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::OfficeAdmin => "office_admin",
            Role::HrManager => "hr_manager",
            Role::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> Result<Self, cmc_common::Error> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| cmc_common::Error::InvalidInput(format!("Unknown role: {}", value)))
    }

    pub fn can(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::SuperAdmin => true,
            Role::OfficeAdmin => matches!(
                permission,
                ManageUsers | ManageOrganization | ManageDepartments | ViewEmployees
            ),
            Role::HrManager => matches!(
                permission,
                ManageDepartments | ManageEmployees | ViewEmployees
            ),
            Role::Employee => false,
        }
    }

    /// Whether an account with this role may grant `target` to someone
    pub fn can_assign(&self, target: Role) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::OfficeAdmin => target != Role::SuperAdmin,
            Role::HrManager | Role::Employee => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        *self != Role::Employee
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = cmc_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("admin").is_err());
        assert!(Role::parse("SUPER_ADMIN").is_err());
    }

    #[test]
    fn test_super_admin_has_every_permission() {
        for permission in [
            Permission::ManageUsers,
            Permission::ManageOrganization,
            Permission::ManageDepartments,
            Permission::ManageEmployees,
            Permission::ViewEmployees,
        ] {
            assert!(Role::SuperAdmin.can(permission));
            assert!(!Role::Employee.can(permission));
        }
    }

    #[test]
    fn test_office_admin_cannot_manage_employees() {
        assert!(Role::OfficeAdmin.can(Permission::ManageUsers));
        assert!(Role::OfficeAdmin.can(Permission::ViewEmployees));
        assert!(!Role::OfficeAdmin.can(Permission::ManageEmployees));
    }

    #[test]
    fn test_hr_manager_cannot_manage_users() {
        assert!(Role::HrManager.can(Permission::ManageEmployees));
        assert!(!Role::HrManager.can(Permission::ManageUsers));
        assert!(!Role::HrManager.can(Permission::ManageOrganization));
    }

    #[test]
    fn test_role_assignment() {
        assert!(Role::SuperAdmin.can_assign(Role::SuperAdmin));
        assert!(Role::OfficeAdmin.can_assign(Role::HrManager));
        assert!(!Role::OfficeAdmin.can_assign(Role::SuperAdmin));
        assert!(!Role::HrManager.can_assign(Role::Employee));
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Role::HrManager).unwrap(), "\"hr_manager\"");
        let role: Role = serde_json::from_str("\"office_admin\"").unwrap();
        assert_eq!(role, Role::OfficeAdmin);
    }
}
