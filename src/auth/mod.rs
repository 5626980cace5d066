pub mod cookies;
pub mod csrf;
pub(crate) mod extractors;
pub mod middleware;
pub mod password;
