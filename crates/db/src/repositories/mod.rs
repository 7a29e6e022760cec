//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool` for standalone reads, or a [`Tx`](crate::Tx) for anything that
//! must commit together with the rest of a workflow operation.

pub mod announcement_repo;
pub mod approval_action_repo;
pub mod approval_repo;
pub mod approval_step_repo;
pub mod approval_version_repo;
pub mod attachment_repo;
pub mod employee_repo;
pub mod user_repo;

pub use announcement_repo::AnnouncementRepo;
pub use approval_action_repo::ApprovalActionRepo;
pub use approval_repo::ApprovalRepo;
pub use approval_step_repo::ApprovalStepRepo;
pub use approval_version_repo::ApprovalVersionRepo;
pub use attachment_repo::AttachmentRepo;
pub use employee_repo::EmployeeRepo;
pub use user_repo::UserRepo;
