//! Third-party account connections over OAuth2.

pub mod dropbox;
pub mod dto;
pub mod handlers;
pub mod memory;
pub mod provider;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use handlers::oauth_routes;
