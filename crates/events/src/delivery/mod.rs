//! Mail transports.

pub mod email;
pub mod log;
