//! Well-known role names and permission keys.
//!
//! Role names must match the `CHECK` constraint on `users.role` in
//! `20260301000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Permission flag that grants access to the approvals module.
pub const PERM_APPROVALS: &str = "approvals";

/// Permission flag that grants access to the announcement wall.
pub const PERM_ANNOUNCEMENTS: &str = "announcements";
