//! Pure domain logic for the hotel portal approval workflow.
//!
//! Nothing in this crate performs I/O: the database and HTTP layers feed it
//! rows and act on the decisions it returns.

pub mod approval;
pub mod attachment;
pub mod chain;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod roles;
pub mod search;
pub mod types;
pub mod visibility;
