//! HTTP server lifecycle: wiring, bind and graceful shutdown.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::routes::{RouterOptions, create_router};
use crate::config::{EmailProvider, Environment, settings::Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::repositories::Repositories;
use crate::services::{Services, mailer::build_mailer};
use crate::state::AppState;

pub struct Server {
    settings: Settings,
    environment: Environment,
}

impl Server {
    pub fn new(settings: Settings, environment: Environment) -> Self {
        Self {
            settings,
            environment,
        }
    }

    /// Start the server and run until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    /// - Pool or migration failures
    /// - Invalid CORS origins or mail provider settings
    /// - Address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        let Server {
            settings,
            environment,
        } = self;

        info!(
            app_name = %settings.application.name,
            app_version = %crate::pkg_version(),
            environment = %environment,
            "Application starting"
        );
        info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            "Server configuration loaded"
        );
        info!(
            allowed_domains = ?settings.identity.allowed_email_domains,
            verification_disabled = settings.identity.disable_email_verification,
            session_ttl_hours = settings.session.ttl_hours,
            "Identity configuration loaded"
        );

        if environment.is_production() {
            warn_on_development_settings(&settings);
        }

        if settings.database.auto_migrate {
            let applied = run_pending_migrations(&settings.database.url).await?;
            if applied.is_empty() {
                info!("Database schema is up to date");
            } else {
                info!(count = applied.len(), migrations = ?applied, "Applied pending migrations");
            }
        }

        let pool = establish_async_connection_pool(&settings.database).await?;
        let mailer = build_mailer(&settings.email)?;
        let services = Services::new(
            Repositories::postgres(pool.clone()),
            mailer,
            settings.identity.clone(),
            settings.session.clone(),
        );
        let state = AppState::new(services, pool);

        let router = create_router(
            state,
            &RouterOptions {
                cors: settings.cors.clone(),
                request_timeout: Duration::from_secs(settings.server.request_timeout),
            },
        )?;

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server shutdown complete");
        Ok(())
    }
}

fn warn_on_development_settings(settings: &Settings) {
    if settings.email.provider == EmailProvider::Log {
        warn!("Mail provider is 'log'; verification codes are only written to the log");
    }
    if !settings.session.secure_cookie {
        warn!("session.secure_cookie is off; session cookies will be sent over plain HTTP");
    }
    if settings.cors.allowed_origins.is_empty() {
        warn!("cors.allowed_origins is empty; any origin is mirrored with credentials");
    }
    if settings.identity.disable_email_verification {
        warn!("Email verification is disabled");
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install is logged
/// and never fires, so the other signal still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
