#[allow(clippy::module_inception)]
pub mod config;

pub use config::{Config, DEFAULT_API_BASE_URL, SessionKey};
