pub mod dto;
pub mod handlers;
pub mod images;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use handlers::gallery_routes;
