//! Applies CLI overrides on top of file and environment configuration.
//!
//! Precedence, highest first: subcommand flags, global flags, `BAZAAR_*`
//! variables, TOML files.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Load the unvalidated base configuration selected by `--config` and `--env`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }
        if let Some(ref path) = cli.config {
            loader = loader.with_file(path);
        }

        let environment = loader.environment();
        Ok(Self::new(loader.load_unvalidated()?, environment))
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Apply overrides and validate what the chosen command needs.
    ///
    /// `migrate` only touches the database, so it does not require session
    /// or mail settings to be complete.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        match cli.command() {
            Commands::Serve {
                host,
                port,
                log_level,
                ..
            } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
                config.validate()?;
            }
            Commands::Migrate { .. } => {
                config.database.validate()?;
                config.logger.validate()?;
            }
        }

        Ok(config)
    }
}
