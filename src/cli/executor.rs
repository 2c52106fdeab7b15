//! Dispatches the parsed command to its handler.

use tracing::warn;

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, settings::Settings};

const LARGE_ROLLBACK: u32 = 10;

pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> anyhow::Result<()> {
    match cli.command() {
        Commands::Serve { dry_run, .. } => {
            warn_on_privileged_port(&settings);
            ServeCommandHandler::new(settings, environment)
                .execute(dry_run)
                .await
        }
        Commands::Migrate { dry_run, rollback } => {
            if let Some(steps) = rollback
                && steps > LARGE_ROLLBACK
            {
                warn!(steps, "Rolling back many migrations; data in dropped tables is lost");
            }
            MigrateCommandHandler::new(settings)
                .execute(dry_run, rollback)
                .await?;
            Ok(())
        }
    }
}

fn warn_on_privileged_port(settings: &Settings) {
    if settings.server.port < 1024 {
        warn!(
            port = settings.server.port,
            "Ports below 1024 usually require elevated privileges"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_serve_dry_run_succeeds_without_database() {
        let cli = Cli::try_parse_from(["campus-bazaar", "serve", "--dry-run"]).unwrap();
        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/bazaar".to_string();
        settings.session.secret = "s".repeat(32);

        assert!(execute_command(&cli, settings, Environment::Test).await.is_ok());
    }

    #[tokio::test]
    async fn test_migrate_surfaces_config_errors() {
        let cli = Cli::try_parse_from(["campus-bazaar", "migrate"]).unwrap();
        let mut settings = Settings::default();
        settings.database.url = String::new();

        assert!(execute_command(&cli, settings, Environment::Test).await.is_err());
    }
}
