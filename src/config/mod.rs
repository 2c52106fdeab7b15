//! Configuration management for campus-bazaar
//!
//! Layered loading, lowest priority first:
//! 1. `default.toml`
//! 2. `{environment}.toml`
//! 3. `local.toml` (not committed)
//! 4. `BAZAAR_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    CorsConfig, DatabaseConfig, EmailConfig, EmailProvider, IdentityConfig, LoggerSettings,
    ServerConfig, SessionConfig, Settings,
};
