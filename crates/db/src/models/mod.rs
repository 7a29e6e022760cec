//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row, plus the create DTOs its repository accepts.

pub mod announcement;
pub mod approval;
pub mod attachment;
pub mod employee;
pub mod user;
