//! `millops-auth`: role-based authorization boundary.
//!
//! This crate is intentionally decoupled from sessions, HTTP and storage: it
//! only answers whether a role carries a permission.

pub mod authorize;
pub mod permissions;
pub mod roles;

pub use authorize::{Actor, AuthzError, RolePolicy};
pub use permissions::Permission;
pub use roles::Role;
