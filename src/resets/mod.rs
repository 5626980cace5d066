//! Password reset tokens. The HTTP side lives in `users::handlers`.

pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;
