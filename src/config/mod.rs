/// Database configuration and connection management
pub mod database;

/// Application settings loading from config.toml
pub mod settings;

/// Bootstrap administrator credentials from environment variables
pub mod users;

pub use settings::{load_app_configuration, AppConfig};
