//! Cookie/Bearer session resolution.
//!
//! `session_middleware` runs on every request and attaches an [`AuthUser`]
//! when a valid session token is present. Handlers that require a session
//! take `AuthUser` as an argument; its extractor rejects with 401 when the
//! middleware found nothing.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookie::session_token;

/// The caller of an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
}

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = &state.services.identity;
    let cookie_name = &identity.session_config().cookie_name;

    if let Some(token) = session_token(request.headers(), cookie_name) {
        match identity.authenticate(&token) {
            Ok(user_id) => {
                request.extensions_mut().insert(AuthUser { user_id });
            }
            Err(e) => debug!(error = %e, "Ignoring invalid session token"),
        }
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::unauthorized("Not authenticated"))
    }
}
