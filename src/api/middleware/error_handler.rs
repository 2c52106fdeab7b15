//! Converts `AppError` into HTTP responses.
//!
//! Every failure leaves the service as `{code, message, details?, request_id?}`.
//! Internal variants are logged with their source chain and rendered with a
//! generic message only.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::api::dto::ErrorResponse;
use crate::api::middleware::RequestId;
use crate::error::AppError;

/// Rendered error body carried in response extensions so the outer
/// middleware can stamp the request id on it.
#[derive(Debug, Clone)]
struct RenderedError {
    code: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl RenderedError {
    fn into_body(self, request_id: Option<&str>) -> ErrorResponse {
        let mut body = ErrorResponse::new(&self.code, self.message);
        if let Some(details) = self.details {
            body = body.with_details(details);
        }
        if let Some(id) = request_id {
            body = body.with_request_id(id);
        }
        body
    }
}

/// Maps an AppError variant to its HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. }
        | AppError::Conflict { .. } => StatusCode::BAD_REQUEST,
        AppError::VerificationRequired { .. } | AppError::Forbidden { .. } => {
            StatusCode::FORBIDDEN
        }
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps an AppError variant to its stable error code.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Duplicate { .. } => "DUPLICATE_ENTRY",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Conflict { .. } => "CONFLICT",
        AppError::VerificationRequired { .. } => "VERIFICATION_REQUIRED",
        AppError::Forbidden { .. } => "FORBIDDEN",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            "INTERNAL_ERROR"
        }
    }
}

fn render(error: &AppError) -> RenderedError {
    let code = error_to_code(error).to_string();
    let (message, details) = match error {
        AppError::NotFound { entity, .. } => (format!("{} not found", capitalize(entity)), None),
        AppError::Duplicate { entity, field, value } => (
            format!("{} with this {} already exists", capitalize(entity), field),
            Some(json!({ "entity": entity, "field": field, "value": value })),
        ),
        AppError::Validation { field, reason } => (
            reason.clone(),
            Some(json!({ "errors": [{ "field": field, "message": reason }] })),
        ),
        AppError::ValidationErrors { errors } => (
            errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Validation failed".to_string()),
            Some(json!({ "errors": errors })),
        ),
        AppError::BadRequest { message }
        | AppError::Conflict { message }
        | AppError::Forbidden { message }
        | AppError::Unauthorized { message } => (message.clone(), None),
        AppError::VerificationRequired { email } => (
            "Email not verified. We sent you a verification code.".to_string(),
            Some(json!({ "requiresVerification": true, "email": email })),
        ),
        AppError::ConnectionPool { .. } => ("Database connection unavailable".to_string(), None),
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            ("An internal error occurred".to_string(), None)
        }
    };

    RenderedError {
        code,
        message,
        details,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        match &self {
            AppError::Database { .. }
            | AppError::Configuration { .. }
            | AppError::Internal { .. }
            | AppError::ConnectionPool { .. } => {
                error!(error = ?self, "Request failed with internal error");
            }
            _ => {}
        }

        let rendered = render(&self);
        let mut response = (status, Json(rendered.clone().into_body(None))).into_response();
        response.extensions_mut().insert(rendered);
        response
    }
}

/// Renders an error with an explicit request id.
pub fn error_to_response_with_request_id(error: AppError, request_id: Option<String>) -> Response {
    let status = error_to_status_code(&error);
    let body = render(&error).into_body(request_id.as_deref());
    (status, Json(body)).into_response()
}

/// Outer middleware that normalizes every error response.
///
/// Errors raised as `AppError` get the request id stamped onto their body.
/// Plain-text failures produced by axum itself (unknown route, wrong method)
/// are rewritten into the standard JSON shape.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let mut response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    if let Some(rendered) = response.extensions_mut().remove::<RenderedError>() {
        let (mut parts, _) = response.into_parts();
        parts.headers.remove(header::CONTENT_LENGTH);
        let body = Json(rendered.into_body(request_id.as_deref()));
        return (parts, body).into_response();
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let (code, message) = match status {
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => {
            ("METHOD_NOT_ALLOWED", "HTTP method not allowed for this endpoint")
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timeout"),
        s if s.is_server_error() => ("INTERNAL_ERROR", "An internal error occurred"),
        _ => ("BAD_REQUEST", "Bad request"),
    };
    warn!(status = status.as_u16(), code, "Normalized non-JSON error response");

    let mut body = ErrorResponse::new(code, message);
    if let Some(id) = request_id.as_deref() {
        body = body.with_request_id(id);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFieldError;
    use axum::body::{Body, to_bytes};
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_and_code_mapping() {
        let cases: Vec<(AppError, StatusCode, &str)> = vec![
            (AppError::not_found("listing", "id", 1), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Duplicate {
                    entity: "user".into(),
                    field: "email".into(),
                    value: "a@illinois.edu".into(),
                },
                StatusCode::CONFLICT,
                "DUPLICATE_ENTRY",
            ),
            (
                AppError::Validation {
                    field: "rating".into(),
                    reason: "bad".into(),
                },
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (AppError::bad_request("x"), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::conflict("x"), StatusCode::BAD_REQUEST, "CONFLICT"),
            (
                AppError::VerificationRequired {
                    email: "a@illinois.edu".into(),
                },
                StatusCode::FORBIDDEN,
                "VERIFICATION_REQUIRED",
            ),
            (AppError::forbidden("x"), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::unauthorized("x"), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("pool"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (AppError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (error, status, code) in cases {
            assert_eq!(error_to_status_code(&error), status, "{error:?}");
            assert_eq!(error_to_code(&error), code, "{error:?}");
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let error = AppError::Database {
            operation: "insert listing".to_string(),
            source: anyhow::anyhow!("relation \"listings\" does not exist"),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("relation"));
    }

    #[tokio::test]
    async fn test_verification_required_details() {
        let response = AppError::VerificationRequired {
            email: "sam@illinois.edu".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["details"]["requiresVerification"], true);
        assert_eq!(body["details"]["email"], "sam@illinois.edu");
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed() {
        let response = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "password".to_string(),
                message: "Password must be at least 8 characters".to_string(),
            }],
        }
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0]["field"], "password");
    }

    #[tokio::test]
    async fn test_explicit_request_id() {
        let response = error_to_response_with_request_id(
            AppError::not_found("user", "id", 9),
            Some("req-1".to_string()),
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["request_id"], "req-1");
    }

    async fn failing() -> Result<&'static str, AppError> {
        Err(AppError::conflict("Listing already sold"))
    }

    fn app() -> Router {
        Router::new()
            .route("/fail", get(failing))
            .layer(middleware::from_fn(global_error_handler))
            .layer(middleware::from_fn(crate::api::middleware::request_id_middleware))
    }

    #[tokio::test]
    async fn test_global_handler_stamps_request_id() {
        let request = Request::builder()
            .uri("/fail")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["message"], "Listing already sold");
        assert_eq!(body["request_id"], "abc-123");
    }

    #[tokio::test]
    async fn test_global_handler_rewrites_unknown_route() {
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body["request_id"].is_string());
    }
}
