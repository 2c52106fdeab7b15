//! Configuration validation logic
//!
//! Every section checks its own invariants; `Settings::validate` reports the
//! first failure with the dotted path of the offending field.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, EmailConfig, EmailProvider, FileSettings, IdentityConfig, LoggerSettings,
    ServerConfig, SessionConfig, Settings,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

const MIN_SESSION_SECRET_LEN: usize = 32;

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::validation(
                "session.secret",
                "Session secret cannot be empty",
            ));
        }

        if self.secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::validation(
                "session.secret",
                "Session secret should be at least 32 characters for security",
            ));
        }

        if self.ttl_hours <= 0 {
            return Err(ConfigError::validation(
                "session.ttl_hours",
                "Session lifetime must be positive",
            ));
        }

        let valid_name = !self.cookie_name.is_empty()
            && self
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(ConfigError::validation(
                "session.cookie_name",
                "Cookie name must be non-empty and use only letters, digits, '_' or '-'",
            ));
        }

        Ok(())
    }
}

impl IdentityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_email_domains.is_empty() {
            return Err(ConfigError::validation(
                "identity.allowed_email_domains",
                "At least one allowed email domain is required",
            ));
        }

        if let Some(bad) = self
            .allowed_email_domains
            .iter()
            .find(|d| !d.starts_with('@') || d.len() < 2)
        {
            return Err(ConfigError::ValidationError {
                field: "identity.allowed_email_domains".to_string(),
                message: format!("Domain '{}' must look like '@example.edu'", bad),
            });
        }

        if self.code_ttl_minutes <= 0 {
            return Err(ConfigError::validation(
                "identity.code_ttl_minutes",
                "Verification code lifetime must be positive",
            ));
        }

        Ok(())
    }
}

impl EmailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider != EmailProvider::Resend {
            return Ok(());
        }

        if self.api_key.is_empty() {
            return Err(ConfigError::validation(
                "email.api_key",
                "An API key is required when email.provider = \"resend\"",
            ));
        }

        if self.from.is_empty() {
            return Err(ConfigError::validation(
                "email.from",
                "A sender address is required when email.provider = \"resend\"",
            ));
        }

        if !(self.api_url.starts_with("https://") || self.api_url.starts_with("http://")) {
            return Err(ConfigError::validation(
                "email.api_url",
                "Email API URL must be an http(s) URL",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate every section, returning the first error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.session.validate()?;
        self.identity.validate()?;
        self.email.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
