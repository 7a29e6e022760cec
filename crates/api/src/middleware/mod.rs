//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`]: the caller, loaded from the database via a JWT Bearer token.
//! - [`rbac::RequireAdmin`]: requires the `admin` role.
//! - [`rbac::RequireApprovals`]: requires admin or the `approvals` permission flag.

pub mod auth;
pub mod rbac;
