//! Application state shared by every request handler.

use crate::db::AsyncDbPool;
use crate::services::Services;

/// Axum state. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Present when the services run on Postgres; used by the health check.
    pub db_pool: Option<AsyncDbPool>,
}

impl AppState {
    pub fn new(services: Services, pool: AsyncDbPool) -> Self {
        Self {
            services,
            db_pool: Some(pool),
        }
    }

    /// State for services running on a non-database backend.
    pub fn detached(services: Services) -> Self {
        Self {
            services,
            db_pool: None,
        }
    }
}
