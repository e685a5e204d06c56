use std::collections::{HashMap, HashSet};

use thiserror::Error;

use millops_core::UserId;

use crate::{Permission, Role};

/// The caller of a service operation: identity plus its single role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden { role: String, permission: String },
}

/// Static role → permission mapping.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePolicy {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy where every listed role may adjust inventory and nothing else is granted.
    pub fn inventory_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        roles.into_iter().fold(Self::new(), |policy, role| {
            policy.grant(Role::new(role.into()), Permission::INVENTORY_ADJUST)
        })
    }

    pub fn grant(mut self, role: Role, permission: Permission) -> Self {
        self.grants.entry(role).or_default().insert(permission);
        self
    }

    pub fn authorize(&self, role: &Role, required: &Permission) -> Result<(), AuthzError> {
        let granted = self.grants.get(role).is_some_and(|perms| {
            perms.contains(required) || perms.iter().any(Permission::is_wildcard)
        });

        if granted {
            Ok(())
        } else {
            Err(AuthzError::Forbidden {
                role: role.as_str().to_string(),
                permission: required.as_str().to_string(),
            })
        }
    }

    pub fn allows(&self, role: &Role, required: &Permission) -> bool {
        self.authorize(role, required).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_inventory_roles_may_adjust() {
        let policy = RolePolicy::inventory_roles(["WAREHOUSE", "SELLER"]);

        assert!(policy.allows(&Role::WAREHOUSE, &Permission::INVENTORY_ADJUST));
        assert!(policy.allows(&Role::SELLER, &Permission::INVENTORY_ADJUST));
        assert!(!policy.allows(&Role::ADMIN, &Permission::INVENTORY_ADJUST));
        assert!(!policy.allows(&Role::USER, &Permission::INVENTORY_ADJUST));
    }

    #[test]
    fn wildcard_grants_everything() {
        let policy = RolePolicy::new().grant(Role::ADMIN, Permission::new("*"));
        assert!(policy.allows(&Role::ADMIN, &Permission::INVENTORY_ADJUST));
    }

    #[test]
    fn denial_names_role_and_permission() {
        let err = RolePolicy::new()
            .authorize(&Role::USER, &Permission::INVENTORY_ADJUST)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "forbidden: role 'USER' lacks permission 'inventory.adjust'"
        );
    }
}
