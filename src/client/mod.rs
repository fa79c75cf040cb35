pub mod admin;
pub mod api;
pub mod attendance;
pub mod auth;

pub use api::ApiClient;
