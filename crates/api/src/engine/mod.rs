//! Approval workflow engine.
//!
//! Every mutating operation locks the approval row, re-checks its
//! preconditions, writes inside one transaction, and only then sends mail.
//!
//! - [`access`]: the acting user, permission checks, and the detail view.
//! - [`workflow`]: create, decide, and content updates.
//! - [`chain`]: append / delete / reorder steps and renumbering.
//! - [`attachments`]: file upload, download, and removal.
//! - [`search`]: listing with visibility and todo filtering.
//! - [`snapshot`]: version history.
//! - [`notify`]: best-effort email after commit.
//! - [`directory`]: employee directory access that degrades on failure.

pub mod access;
pub mod attachments;
pub mod chain;
pub mod directory;
pub mod notify;
pub mod search;
pub mod snapshot;
pub mod workflow;

pub use access::Actor;
