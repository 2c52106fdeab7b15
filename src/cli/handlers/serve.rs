//! `serve`: start the API server, or only check the configuration.

use crate::config::{Environment, settings::Settings};
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Run the server until shutdown, or print a configuration summary when `dry_run`.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config, self.environment).run().await
    }

    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid for {}", self.environment);
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Signup domains: {}",
            self.config.identity.allowed_email_domains.join(", ")
        );
        println!("✓ Mail provider: {:?}", self.config.email.provider);
        if self.config.identity.disable_email_verification {
            println!("! Email verification is disabled");
        }
        println!("Dry run completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/bazaar".to_string();
        config.session.secret = "s".repeat(32);
        config
    }

    #[tokio::test]
    async fn test_dry_run_accepts_valid_config() {
        assert!(ServeCommandHandler::new(valid_config(), Environment::Test).execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_rejects_invalid_config() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(ServeCommandHandler::new(config, Environment::Test).execute(true).await.is_err());
    }
}
