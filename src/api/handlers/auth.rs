//! Account, verification and session endpoints.

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::AUTH_TAG;
use crate::api::dto::{
    ErrorResponse, LoginRequest, ResendVerificationRequest, SignupRequest,
    UserProfileResponse, VerificationPendingResponse, VerifyEmailRequest,
};
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::services::SignupOutcome;
use crate::state::AppState;
use crate::utils::cookie::{clear_session_cookie, session_cookie};
use crate::utils::validate::ValidatedJson;

/// Routes:
/// - `POST /signup`
/// - `POST /verify-email`
/// - `POST /resend-verification`
/// - `POST /login`
/// - `POST /logout`
/// - `GET /me`
pub fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(signup))
        .routes(routes!(verify_email))
        .routes(routes!(resend_verification))
        .routes(routes!(login))
        .routes(routes!(logout))
        .routes(routes!(me))
}

fn set_cookie(response: &mut Response, cookie: String) -> AppResult<()> {
    let value = HeaderValue::from_str(&cookie).map_err(AppError::internal)?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

/// Responds with the user's profile and a fresh session cookie.
async fn start_session(state: &AppState, user_id: i32, status: StatusCode) -> AppResult<Response> {
    let identity = &state.services.identity;
    let token = identity.issue_session(user_id)?;
    let profile = state.services.reputation.profile(user_id).await?;

    let mut response = (status, Json(UserProfileResponse::from(profile))).into_response();
    set_cookie(&mut response, session_cookie(identity.session_config(), &token))?;
    Ok(response)
}

/// POST /api/auth/signup - Create an account
///
/// Accounts that need email verification get a code instead of a session.
#[utoipa::path(
    post,
    path = "/signup",
    tag = AUTH_TAG,
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created and signed in, or a `VerificationPendingResponse` when a code was sent", body = UserProfileResponse),
        (status = 400, description = "Invalid email, domain or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<Response> {
    match state.services.identity.signup(payload.into()).await? {
        SignupOutcome::Authenticated(user) => {
            start_session(&state, user.id, StatusCode::CREATED).await
        }
        SignupOutcome::VerificationRequired { email } => Ok((
            StatusCode::CREATED,
            Json(VerificationPendingResponse::sent(email)),
        )
            .into_response()),
    }
}

/// POST /api/auth/verify-email - Confirm an email with its one-time code
#[utoipa::path(
    post,
    path = "/verify-email",
    tag = AUTH_TAG,
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified and signed in", body = UserProfileResponse),
        (status = 400, description = "Missing, expired or wrong code", body = ErrorResponse),
        (status = 404, description = "No account for this email", body = ErrorResponse)
    )
)]
async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyEmailRequest>,
) -> AppResult<Response> {
    let user = state
        .services
        .identity
        .verify_email(&payload.email, &payload.code)
        .await?;
    start_session(&state, user.id, StatusCode::OK).await
}

/// POST /api/auth/resend-verification - Send a new code
#[utoipa::path(
    post,
    path = "/resend-verification",
    tag = AUTH_TAG,
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Code resent", body = VerificationPendingResponse),
        (status = 400, description = "Already verified or verification disabled", body = ErrorResponse),
        (status = 404, description = "No account for this email", body = ErrorResponse)
    )
)]
async fn resend_verification(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResendVerificationRequest>,
) -> AppResult<Json<VerificationPendingResponse>> {
    let email = state
        .services
        .identity
        .resend_verification(&payload.email)
        .await?;
    Ok(Json(VerificationPendingResponse::resent(email)))
}

/// POST /api/auth/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = UserProfileResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Email verification required; a code was sent", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Response> {
    let user = state
        .services
        .identity
        .login(&payload.email, &payload.password)
        .await?;
    start_session(&state, user.id, StatusCode::OK).await
}

/// POST /api/auth/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/logout",
    tag = AUTH_TAG,
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    tracing::info!(user_id = user.user_id, "User logged out");
    let mut response = StatusCode::NO_CONTENT.into_response();
    set_cookie(
        &mut response,
        clear_session_cookie(state.services.identity.session_config()),
    )?;
    Ok(response)
}

/// GET /api/auth/me - Profile of the signed-in user
#[utoipa::path(
    get,
    path = "/me",
    tag = AUTH_TAG,
    responses(
        (status = 200, description = "Current user", body = UserProfileResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserProfileResponse>> {
    let profile = state.services.reputation.profile(user.user_id).await?;
    Ok(Json(profile.into()))
}
