//! `migrate`: apply, preview or roll back the embedded migrations.

use tracing::info;

use crate::config::settings::Settings;
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::AppResult;

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.config.database.validate()?;
        let url = self.config.database.url.as_str();

        if dry_run {
            let pending = pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations, database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            let reverted = revert_migrations(url, steps).await?;
            info!(count = reverted, "Reverted migrations");
            println!("✓ Rolled back {} migration(s)", reverted);
            return Ok(());
        }

        let applied = run_pending_migrations(url).await?;
        info!(count = applied.len(), "Applied migrations");
        if applied.is_empty() {
            println!("✓ No pending migrations, database is up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {}", version);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_rejects_non_postgres_url_before_connecting() {
        let mut config = Settings::default();
        config.database.url = "sqlite://bazaar.db".to_string();

        let result = MigrateCommandHandler::new(config).execute(true, None).await;
        assert!(matches!(
            result,
            Err(AppError::Configuration { ref key, .. }) if key == "database.url"
        ));
    }
}
