//! Router assembly: API routes, OpenAPI docs and the middleware stack.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    REQUEST_ID_HEADER, global_error_handler, logging_middleware, request_id_middleware,
    session_middleware,
};
use crate::config::CorsConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

/// Everything the router needs besides the state.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub cors: CorsConfig,
    pub request_timeout: Duration,
}

fn cors_layer(config: &CorsConfig) -> AppResult<CorsLayer> {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Configuration {
                key: "cors.allowed_origins".to_string(),
                source: anyhow::Error::from(e),
            })?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]))
}

/// API routes and their OpenAPI description.
pub fn api_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", handlers::health::health_routes())
        .nest("/api/auth", handlers::auth::auth_routes())
        .nest("/api/listings", handlers::listings::listing_routes())
        .nest("/api/purchases", handlers::purchases::purchase_routes())
        .nest("/api/wishlist", handlers::wishlist::wishlist_routes())
        .nest("/api/users", handlers::users::user_routes())
}

/// Creates the application router.
///
/// Layers run outermost first: CORS, compression, request id, access log,
/// error normalization, timeout, session.
pub fn create_router(state: AppState, options: &RouterOptions) -> AppResult<Router> {
    let (router, openapi) = api_router().split_for_parts();

    let router = router
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, openapi))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&options.cors)?)
        .with_state(state);

    Ok(router)
}
