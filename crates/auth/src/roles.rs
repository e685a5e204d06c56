use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque upper-case strings (`"WAREHOUSE"`, `"SELLER"`, ...); mapping
/// roles to permissions is done by [`crate::RolePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("ADMIN"));
    pub const USER: Role = Role(Cow::Borrowed("USER"));
    pub const WAREHOUSE: Role = Role(Cow::Borrowed("WAREHOUSE"));
    pub const SELLER: Role = Role(Cow::Borrowed("SELLER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
