/// Database connection, table creation and schema migration
pub mod database;

/// Application configuration loaded from `salesbook.toml` and the environment
pub mod settings;

pub use settings::{AppConfig, SecuritySettings, load_app_configuration};
