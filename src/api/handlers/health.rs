//! Health check endpoints for load balancers and monitoring.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::Json};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::db::AsyncDbPool;
use crate::state::AppState;

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(liveness_check))
}

/// GET /api/health - Service and database status
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A dependency is down", body = HealthResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = BTreeMap::new();
    if let Some(pool) = &state.db_pool {
        checks.insert("database".to_string(), check_database(pool).await);
    }

    let status = HealthResponse::aggregate(&checks);
    let response = HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: jiff::Timestamp::now().to_string(),
        checks,
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(response))
}

/// GET /api/health/live - Liveness probe, no dependency checks
#[utoipa::path(
    get,
    path = "/health/live",
    tag = HEALTH_TAG,
    responses((status = 200, description = "Service is alive"))
)]
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

async fn check_database(pool: &AsyncDbPool) -> ComponentHealth {
    use diesel_async::RunQueryDsl;

    let start = Instant::now();
    let elapsed = |start: Instant| Some(start.elapsed().as_millis() as u64);

    match pool.get().await {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn).await {
            Ok(_) => ComponentHealth {
                status: HealthStatus::Healthy,
                message: Some("Connected".to_string()),
                response_time_ms: elapsed(start),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Health check query failed");
                ComponentHealth {
                    status: HealthStatus::Unhealthy,
                    message: Some("Query failed".to_string()),
                    response_time_ms: elapsed(start),
                }
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not get a connection");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                message: Some("Connection unavailable".to_string()),
                response_time_ms: elapsed(start),
            }
        }
    }
}
