pub mod admin;
pub mod announcements;
pub mod approval;
pub mod attachments;
pub mod auth;
pub mod directory;
pub mod me;
pub mod steps;
pub mod versions;
